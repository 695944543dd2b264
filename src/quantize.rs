//! Uniform scalar quantization of DCT coefficients.
//!
//! The baseline uses a single step for every frequency; there is no
//! per-coefficient quantization matrix.

use crate::error::McodecError;

/// Maps a quality in `[1, 100]` to the uniform quantizer step
/// `clamp(101 - quality, 1, 100)`. Quality 100 gives step 1.
pub fn step_from_quality(quality: u16) -> i32 {
    (101 - i32::from(quality)).clamp(1, 100)
}

fn check_layout(len: usize, block_size: usize) -> Result<(), McodecError> {
    if block_size != 8 && block_size != 16 {
        return Err(McodecError::InvalidBlockSize);
    }
    if len % (block_size * block_size) != 0 {
        return Err(McodecError::InvalidBufferLength);
    }
    Ok(())
}

/// Quantizes coefficients to `round(F / step)`, saturating at the i16
/// range.
pub fn quantize(
    coeffs: &[f32],
    block_size: usize,
    quality: u16,
) -> Result<Vec<i16>, McodecError> {
    check_layout(coeffs.len(), block_size)?;

    let step = step_from_quality(quality) as f32;
    let quantized = coeffs
        .iter()
        .map(|&c| {
            let q = (c / step).round();
            if q >= f32::from(i16::MAX) {
                i16::MAX
            } else if q <= f32::from(i16::MIN) {
                i16::MIN
            } else {
                q as i16
            }
        })
        .collect();
    Ok(quantized)
}

/// Reconstructs coefficients as `q * step`.
pub fn dequantize(
    qcoeffs: &[i16],
    block_size: usize,
    quality: u16,
) -> Result<Vec<f32>, McodecError> {
    check_layout(qcoeffs.len(), block_size)?;

    let step = step_from_quality(quality) as f32;
    Ok(qcoeffs.iter().map(|&q| f32::from(q) * step).collect())
}
