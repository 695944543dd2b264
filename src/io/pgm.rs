//! Binary PGM (P5) parsing and serialization.
//!
//! 16-bit PGM samples are big-endian on the wire. Loaded images are
//! always unsigned with `bits_stored = bits_allocated` derived from the
//! maxval.

use byteorder::{BigEndian, ByteOrder};

use crate::error::McodecError;
use crate::Image;

struct Tokenizer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Skips whitespace and `#` comment lines between header tokens.
    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'#' {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a [u8], McodecError> {
        self.skip_separators();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(McodecError::MalformedPgm);
        }
        Ok(&self.bytes[start..self.pos])
    }

    fn number(&mut self) -> Result<u32, McodecError> {
        let token = self.token()?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(McodecError::MalformedPgm)
    }
}

/// Parses a binary PGM (P5) buffer.
pub fn parse_pgm(bytes: &[u8]) -> Result<Image, McodecError> {
    let mut t = Tokenizer::new(bytes);
    if t.token()? != b"P5" {
        return Err(McodecError::MalformedPgm);
    }
    let width = t.number()?;
    let height = t.number()?;
    let maxval = t.number()?;
    if width == 0 || height == 0 || maxval == 0 || maxval > 65535 {
        return Err(McodecError::MalformedPgm);
    }
    // Exactly one whitespace byte separates the header from the samples.
    if !bytes
        .get(t.pos)
        .is_some_and(|b| b.is_ascii_whitespace())
    {
        return Err(McodecError::MalformedPgm);
    }
    let payload = &bytes[t.pos + 1..];

    let count = width as usize * height as usize;
    let bits: u16 = if maxval <= 255 { 8 } else { 16 };
    let pixels = if bits == 8 {
        if payload.len() < count {
            return Err(McodecError::MalformedPgm);
        }
        payload[..count].iter().map(|&b| i32::from(b)).collect()
    } else {
        if payload.len() < count * 2 {
            return Err(McodecError::MalformedPgm);
        }
        (0..count)
            .map(|i| i32::from(BigEndian::read_u16(&payload[i * 2..])))
            .collect()
    };

    Ok(Image {
        width,
        height,
        channels: 1,
        bits_allocated: bits,
        bits_stored: bits,
        is_signed: false,
        pixels,
    })
}

/// Serializes an image as binary PGM (P5).
///
/// The maxval is `2^bits_stored - 1` (255 for depths of 8 or less);
/// samples are clamped into range and 16-bit samples are written
/// big-endian.
pub fn write_pgm(image: &Image) -> Result<Vec<u8>, McodecError> {
    if image.channels != 1 {
        return Err(McodecError::NotGrayscale);
    }
    if image.width == 0 || image.height == 0 {
        return Err(McodecError::InvalidDimensions);
    }
    if image.pixels.len() != image.width as usize * image.height as usize {
        return Err(McodecError::PixelBufferMismatch);
    }
    if image.bits_stored < 1 || image.bits_stored > 16 {
        return Err(McodecError::InvalidBitDepth);
    }

    let maxval: i32 = if image.bits_stored <= 8 {
        255
    } else {
        (1 << image.bits_stored) - 1
    };

    let mut out = format!("P5\n{} {}\n{}\n", image.width, image.height, maxval).into_bytes();
    if maxval == 255 {
        out.extend(image.pixels.iter().map(|&v| v.clamp(0, maxval) as u8));
    } else {
        let mut word = [0u8; 2];
        for &v in &image.pixels {
            BigEndian::write_u16(&mut word, v.clamp(0, maxval) as u16);
            out.extend_from_slice(&word);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_8bit_with_comment() {
        let mut data = b"P5\n# a comment\n4 2\n255\n".to_vec();
        data.extend_from_slice(&[0, 1, 2, 3, 250, 251, 252, 253]);
        let img = parse_pgm(&data).unwrap();
        assert_eq!((img.width, img.height), (4, 2));
        assert_eq!((img.bits_allocated, img.bits_stored), (8, 8));
        assert!(!img.is_signed);
        assert_eq!(img.pixels, vec![0, 1, 2, 3, 250, 251, 252, 253]);
    }

    #[test]
    fn test_parse_16bit_big_endian() {
        let mut data = b"P5\n2 1\n4095\n".to_vec();
        data.extend_from_slice(&[0x0F, 0xFF, 0x00, 0x01]);
        let img = parse_pgm(&data).unwrap();
        assert_eq!(img.bits_allocated, 16);
        assert_eq!(img.pixels, vec![4095, 1]);
    }

    #[test]
    fn test_save_load_roundtrip_8bit() {
        let img = Image {
            width: 3,
            height: 2,
            channels: 1,
            bits_allocated: 8,
            bits_stored: 8,
            is_signed: false,
            pixels: vec![0, 64, 128, 192, 254, 255],
        };
        let bytes = write_pgm(&img).unwrap();
        assert_eq!(parse_pgm(&bytes).unwrap(), img);
    }

    #[test]
    fn test_save_16bit_clamps() {
        let img = Image {
            width: 2,
            height: 1,
            channels: 1,
            bits_allocated: 16,
            bits_stored: 12,
            is_signed: false,
            pixels: vec![-5, 5000],
        };
        let bytes = write_pgm(&img).unwrap();
        let loaded = parse_pgm(&bytes).unwrap();
        assert_eq!(loaded.pixels, vec![0, 4095]);
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert_eq!(parse_pgm(b"P6\n1 1\n255\n\0"), Err(McodecError::MalformedPgm));
        assert_eq!(parse_pgm(b"P5\n0 1\n255\n\0"), Err(McodecError::MalformedPgm));
        assert_eq!(parse_pgm(b"P5\n2 2\n255\n\0"), Err(McodecError::MalformedPgm));
        assert_eq!(parse_pgm(b"P5\n1 1\n99999\n\0"), Err(McodecError::MalformedPgm));
    }
}
