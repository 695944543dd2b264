//! Image tiling into zero-padded blocks and the inverse crop.

use crate::error::McodecError;
use crate::Image;

/// Block grid derived from image dimensions and the block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    pub block_size: usize,
    pub blocks_x: usize,
    pub blocks_y: usize,
    pub padded_w: usize,
    pub padded_h: usize,
}

impl BlockGrid {
    /// Derives the grid for a `width x height` image. Only block sizes 8
    /// and 16 are supported.
    pub fn new(width: u32, height: u32, block_size: u16) -> Result<Self, McodecError> {
        if block_size != 8 && block_size != 16 {
            return Err(McodecError::InvalidBlockSize);
        }
        if width == 0 || height == 0 {
            return Err(McodecError::InvalidDimensions);
        }
        let n = usize::from(block_size);
        let blocks_x = (width as usize).div_ceil(n);
        let blocks_y = (height as usize).div_ceil(n);
        Ok(Self {
            block_size: n,
            blocks_x,
            blocks_y,
            padded_w: blocks_x * n,
            padded_h: blocks_y * n,
        })
    }

    /// Total sample count of the padded, block-sequential buffer.
    pub fn padded_len(&self) -> usize {
        self.padded_w * self.padded_h
    }
}

fn check_image(image: &Image) -> Result<(), McodecError> {
    if image.channels != 1 {
        return Err(McodecError::NotGrayscale);
    }
    if image.width == 0 || image.height == 0 {
        return Err(McodecError::InvalidDimensions);
    }
    if image.pixels.len() != image.width as usize * image.height as usize {
        return Err(McodecError::PixelBufferMismatch);
    }
    Ok(())
}

/// Copies the image into a zero-padded block-sequential buffer.
///
/// Samples outside the `width x height` rectangle are zero; after level
/// shift that is the mid-gray of the original unsigned domain.
pub fn tile_to_blocks(image: &Image, grid: &BlockGrid) -> Result<Vec<i32>, McodecError> {
    check_image(image)?;

    let n = grid.block_size;
    let width = image.width as usize;
    let height = image.height as usize;
    let mut padded = vec![0i32; grid.padded_len()];

    for by in 0..grid.blocks_y {
        for bx in 0..grid.blocks_x {
            let block_base = (by * grid.blocks_x + bx) * n * n;
            for y in 0..n {
                let py = by * n + y;
                if py >= height {
                    break;
                }
                for x in 0..n {
                    let px = bx * n + x;
                    if px >= width {
                        break;
                    }
                    padded[block_base + y * n + x] = image.pixels[py * width + px];
                }
            }
        }
    }
    Ok(padded)
}

/// Crops the top-left `width x height` samples out of a block-sequential
/// buffer, discarding the padding margins.
pub fn untile_from_blocks(
    image: &mut Image,
    grid: &BlockGrid,
    padded: &[i32],
) -> Result<(), McodecError> {
    if image.channels != 1 {
        return Err(McodecError::NotGrayscale);
    }
    if image.width == 0 || image.height == 0 {
        return Err(McodecError::InvalidDimensions);
    }
    if padded.len() != grid.padded_len() {
        return Err(McodecError::PixelBufferMismatch);
    }

    let n = grid.block_size;
    let width = image.width as usize;
    let height = image.height as usize;
    image.pixels.resize(width * height, 0);

    for y in 0..height {
        let by = y / n;
        for x in 0..width {
            let bx = x / n;
            let block_base = (by * grid.blocks_x + bx) * n * n;
            image.pixels[y * width + x] = padded[block_base + (y % n) * n + (x % n)];
        }
    }
    Ok(())
}
