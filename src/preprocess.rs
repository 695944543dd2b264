//! Level shift: translation of unsigned samples into a zero-centered
//! signed domain so the DCT's zero-frequency bin absorbs the mean.

use crate::constants::{MAXIMUM_BITS_STORED, MINIMUM_BITS_STORED};
use crate::error::McodecError;
use crate::Image;

fn check_bits_stored(image: &Image) -> Result<(), McodecError> {
    if image.bits_stored < MINIMUM_BITS_STORED || image.bits_stored > MAXIMUM_BITS_STORED {
        return Err(McodecError::InvalidBitDepth);
    }
    Ok(())
}

/// Shifts an unsigned image by `-2^(bits_stored - 1)` and marks the
/// working copy as signed. Signed inputs pass through untouched.
pub fn apply_level_shift(image: &mut Image) -> Result<(), McodecError> {
    if image.pixels.is_empty() {
        return Ok(());
    }
    check_bits_stored(image)?;
    if image.is_signed {
        return Ok(());
    }

    let offset = 1i32 << (image.bits_stored - 1);
    for v in &mut image.pixels {
        *v -= offset;
    }
    image.is_signed = true;
    Ok(())
}

/// Undoes [`apply_level_shift`]: adds `2^(bits_stored - 1)` back and
/// clamps into `[0, 2^bits_stored - 1]`. The caller decides whether to
/// invoke this from the container's flag bit, never from `is_signed`.
pub fn inverse_level_shift(image: &mut Image) -> Result<(), McodecError> {
    if image.pixels.is_empty() {
        return Ok(());
    }
    check_bits_stored(image)?;

    let offset = 1i32 << (image.bits_stored - 1);
    let max_value = (1i32 << image.bits_stored) - 1;
    for v in &mut image.pixels {
        *v = (*v + offset).clamp(0, max_value);
    }
    image.is_signed = false;
    Ok(())
}
