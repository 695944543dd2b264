//! `.mcodec` encoder: composes the pipeline stages and frames the payload.

use crate::bitstream::ByteWriter;
use crate::block::{tile_to_blocks, zigzag_scan_blocks, BlockGrid};
use crate::constants::{
    DEFAULT_BLOCK_SIZE, FLAG_LEVEL_SHIFT, MAXIMUM_QUALITY, MINIMUM_QUALITY, PAYLOAD_BYTES_OFFSET,
    TABLE_RECORD_BYTES,
};
use crate::dct;
use crate::entropy::{huff_encode, pack_rle_symbols, rle_encode_zeros};
use crate::error::McodecError;
use crate::header::McodecHeader;
use crate::preprocess::apply_level_shift;
use crate::quantize::quantize;
use crate::Image;

/// Encodes a grayscale image into a `.mcodec` byte vector.
///
/// The pipeline: level shift (unsigned inputs only), tile into padded
/// 8x8 blocks, forward DCT, uniform quantization, zigzag scan, zero-RLE,
/// symbol packing, canonical Huffman. The header goes out first with a
/// zero `payload_bytes` and is patched in place once the payload size is
/// known.
pub fn encode(image: &Image, quality: u16) -> Result<Vec<u8>, McodecError> {
    if image.channels != 1 {
        return Err(McodecError::NotGrayscale);
    }
    if image.width == 0 || image.height == 0 {
        return Err(McodecError::InvalidDimensions);
    }
    if image.pixels.len() != image.width as usize * image.height as usize {
        return Err(McodecError::PixelBufferMismatch);
    }
    if !(MINIMUM_QUALITY..=MAXIMUM_QUALITY).contains(&quality) {
        return Err(McodecError::InvalidQuality);
    }

    let mut working = image.clone();
    let level_shift_applied = !working.is_signed;
    apply_level_shift(&mut working)?;

    let block_size = DEFAULT_BLOCK_SIZE;
    let grid = BlockGrid::new(working.width, working.height, block_size)?;
    let samples = tile_to_blocks(&working, &grid)?;
    let coeffs = dct::forward_blocks(&samples, grid.block_size)?;
    let qcoeffs = quantize(&coeffs, grid.block_size, quality)?;
    let seq = zigzag_scan_blocks(&qcoeffs, grid.block_size)?;
    let pairs = rle_encode_zeros(&seq, grid.block_size)?;
    let symbols = pack_rle_symbols(&pairs);
    let (table, bits) = huff_encode(&symbols)?;

    let entries = table.sorted_code_lengths();
    if entries.is_empty() {
        return Err(McodecError::NoUsedSymbols);
    }

    // symbol_count + used_symbol_count + table records + bit bytes
    let payload_bytes = (4 + 4 + entries.len() * TABLE_RECORD_BYTES + bits.len()) as u32;

    // The header records the *input* image's signedness; flag bit 0 is
    // what tells the decoder whether to undo the level shift.
    let flags = if level_shift_applied {
        FLAG_LEVEL_SHIFT
    } else {
        0
    };
    let mut w = ByteWriter::new();
    McodecHeader::from_image(image, flags, block_size, quality).write(&mut w);

    w.write_u32_le(symbols.len() as u32);
    w.write_u32_le(entries.len() as u32);
    for &(symbol, len) in &entries {
        w.write_u32_le(symbol);
        w.write_u8(len);
    }
    w.write_bytes(&bits);

    let mut bytes = w.into_bytes();
    bytes[PAYLOAD_BYTES_OFFSET..PAYLOAD_BYTES_OFFSET + 4]
        .copy_from_slice(&payload_bytes.to_le_bytes());
    debug_assert_eq!(bytes.len() as u32, 32 + payload_bytes);
    Ok(bytes)
}
