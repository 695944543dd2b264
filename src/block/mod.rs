//! Block tiling and coefficient scan order.
//!
//! The codec processes the image as a grid of `N x N` blocks (`N` is 8 or
//! 16). Every buffer that crosses a stage boundary is in block-raster
//! order: block `(bx, by)` lives at offset `(by * blocks_x + bx) * N * N`,
//! row-major within the block.

pub mod tiling;
pub mod zigzag;

pub use tiling::{tile_to_blocks, untile_from_blocks, BlockGrid};
pub use zigzag::{inverse_zigzag_blocks, make_zigzag_order, zigzag_scan_blocks};
