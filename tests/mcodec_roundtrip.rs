// End-to-end container tests: encode -> decode round trips, header
// layout, quality/rate behavior, and malformed-input handling.

use mcodec_rs::{decode, encode, Image, McodecError};

fn gray(width: u32, height: u32, bits_stored: u16, pixels: Vec<i32>) -> Image {
    Image {
        width,
        height,
        channels: 1,
        bits_allocated: if bits_stored <= 8 { 8 } else { 16 },
        bits_stored,
        is_signed: false,
        pixels,
    }
}

fn rmse(a: &Image, b: &Image) -> f64 {
    assert_eq!(a.pixels.len(), b.pixels.len());
    let mse: f64 = a
        .pixels
        .iter()
        .zip(&b.pixels)
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum::<f64>()
        / a.pixels.len() as f64;
    mse.sqrt()
}

#[test]
fn test_constant_image_header_fields() {
    let image = gray(16, 16, 8, vec![128; 256]);
    let bytes = encode(&image, 50).unwrap();

    assert_eq!(&bytes[0..4], b"MCDC");
    assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 1); // version
    assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 32); // header_bytes
    assert_eq!(
        u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        16
    );
    assert_eq!(
        u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        16
    );
    assert_eq!(u16::from_le_bytes([bytes[16], bytes[17]]), 1); // channels
    assert_eq!(u16::from_le_bytes([bytes[18], bytes[19]]), 8); // bits_allocated
    assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 8); // bits_stored
    assert_eq!(bytes[22], 0); // is_signed: the input image's, not the shifted copy's
    assert_eq!(bytes[23], 1); // flags: level shift applied
    assert_eq!(u16::from_le_bytes([bytes[24], bytes[25]]), 8); // block_size
    assert_eq!(u16::from_le_bytes([bytes[26], bytes[27]]), 50); // quality
    let payload = u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);
    assert_eq!(bytes.len(), 32 + payload as usize);
}

#[test]
fn test_constant_image_is_exact_at_quality_50() {
    // Only the mean survives quantization, and the mean is exact.
    let image = gray(16, 16, 8, vec![128; 256]);
    let decoded = decode(&encode(&image, 50).unwrap()).unwrap();
    assert_eq!(decoded, image);
}

#[test]
fn test_constant_image_survives_quality_1() {
    let image = gray(16, 16, 8, vec![128; 256]);
    let decoded = decode(&encode(&image, 1).unwrap()).unwrap();
    assert_eq!(decoded.pixels.len(), 256);
    for &v in &decoded.pixels {
        assert!((v - 128).abs() <= 1, "sample {} too far from 128", v);
    }
}

#[test]
fn test_ramp_rmse_tracks_quality() {
    // 32x24 wrapping ramp; linear inside every 8x8 block.
    let pixels: Vec<i32> = (0..32 * 24).map(|i| i % 256).collect();
    let image = gray(32, 24, 8, pixels);

    let fine = decode(&encode(&image, 90).unwrap()).unwrap();
    let coarse = decode(&encode(&image, 10).unwrap()).unwrap();

    let rmse_fine = rmse(&image, &fine);
    let rmse_coarse = rmse(&image, &coarse);
    assert!(rmse_fine <= 3.0, "rmse at quality 90: {}", rmse_fine);
    assert!(rmse_coarse <= 20.0, "rmse at quality 10: {}", rmse_coarse);
    assert!(
        rmse_fine <= rmse_coarse,
        "finer quantization should not be worse"
    );
}

#[test]
fn test_higher_quality_costs_more_bytes() {
    let pixels: Vec<i32> = (0..64 * 64).map(|i| (i * 7) % 256).collect();
    let image = gray(64, 64, 8, pixels);
    let q95 = encode(&image, 95).unwrap();
    let q20 = encode(&image, 20).unwrap();
    assert!(q95.len() > q20.len());
}

#[test]
fn test_12bit_image_preserves_depth_and_range() {
    let pixels: Vec<i32> = (0..24 * 24).map(|i| (i * 17) % 4096).collect();
    let image = gray(24, 24, 12, pixels);

    let decoded = decode(&encode(&image, 80).unwrap()).unwrap();
    assert_eq!(decoded.width, 24);
    assert_eq!(decoded.height, 24);
    assert_eq!(decoded.channels, 1);
    assert_eq!(decoded.bits_allocated, 16);
    assert_eq!(decoded.bits_stored, 12);
    assert!(!decoded.is_signed);
    for &v in &decoded.pixels {
        assert!((0..=4095).contains(&v), "sample {} outside 12-bit range", v);
    }
}

#[test]
fn test_signed_image_roundtrip_no_level_shift() {
    // Linear per block, well inside the signed 8-bit range.
    let pixels: Vec<i32> = (0..16i32 * 16)
        .map(|i| (i % 16) + 4 * (i / 16) - 100)
        .collect();
    let mut image = gray(16, 16, 8, pixels);
    image.is_signed = true;

    let bytes = encode(&image, 100).unwrap();
    assert_eq!(bytes[22], 1); // is_signed
    assert_eq!(bytes[23], 0); // no level shift for signed inputs

    let decoded = decode(&bytes).unwrap();
    assert!(decoded.is_signed);
    assert_eq!(decoded.bits_stored, 8);
    for (&orig, &recon) in image.pixels.iter().zip(&decoded.pixels) {
        assert!(
            (orig - recon).abs() <= 1,
            "quality 100 must be near-lossless: {} vs {}",
            orig,
            recon
        );
    }
}

#[test]
fn test_block_linear_image_near_lossless_at_quality_100() {
    let pixels: Vec<i32> = (0..32 * 24).map(|i| i % 256).collect();
    let image = gray(32, 24, 8, pixels);
    let decoded = decode(&encode(&image, 100).unwrap()).unwrap();
    for (&orig, &recon) in image.pixels.iter().zip(&decoded.pixels) {
        assert!((orig - recon).abs() <= 1);
    }
}

#[test]
fn test_odd_dimensions_roundtrip() {
    // 21x13 forces padding in both directions.
    let pixels: Vec<i32> = (0..21 * 13).map(|i| (i * 3) % 200).collect();
    let image = gray(21, 13, 8, pixels);
    let decoded = decode(&encode(&image, 100).unwrap()).unwrap();
    assert_eq!(decoded.width, 21);
    assert_eq!(decoded.height, 13);
    assert_eq!(decoded.pixels.len(), 21 * 13);
}

#[test]
fn test_truncated_file_fails_with_premature_eof() {
    let image = gray(16, 16, 8, vec![128; 256]);
    let bytes = encode(&image, 50).unwrap();
    assert_eq!(
        decode(&bytes[..bytes.len() - 1]),
        Err(McodecError::PrematureEof)
    );
}

#[test]
fn test_corrupted_magic_fails_with_bad_magic() {
    let image = gray(16, 16, 8, vec![128; 256]);
    let mut bytes = encode(&image, 50).unwrap();
    bytes[0] ^= 0xFF;
    assert_eq!(decode(&bytes), Err(McodecError::BadMagic));
}

#[test]
fn test_decode_rejects_overstated_payload() {
    let image = gray(16, 16, 8, vec![128; 256]);
    let mut bytes = encode(&image, 50).unwrap();
    let declared = u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);
    bytes[28..32].copy_from_slice(&(declared + 1).to_le_bytes());
    assert_eq!(decode(&bytes), Err(McodecError::PrematureEof));
}

#[test]
fn test_trailing_garbage_is_ignored() {
    // payload_bytes bounds the payload; bytes past it do not participate.
    let image = gray(16, 16, 8, vec![128; 256]);
    let mut bytes = encode(&image, 50).unwrap();
    bytes.extend_from_slice(&[0xEE; 9]);
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded, image);
}

#[test]
fn test_decode_is_deterministic() {
    let pixels: Vec<i32> = (0..48 * 32).map(|i| (i * 13) % 256).collect();
    let image = gray(48, 32, 8, pixels);
    let a = encode(&image, 40).unwrap();
    let b = encode(&image, 40).unwrap();
    assert_eq!(a, b, "encoder must be deterministic");
    assert_eq!(decode(&a).unwrap(), decode(&b).unwrap());
}
