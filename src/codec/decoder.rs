//! `.mcodec` decoder: runs the exact inverse of the encode pipeline.

use crate::bitstream::ByteReader;
use crate::block::{inverse_zigzag_blocks, untile_from_blocks, BlockGrid};
use crate::constants::{
    FLAG_LEVEL_SHIFT, MAXIMUM_CODE_LENGTH, MCODEC_HEADER_BYTES, TABLE_RECORD_BYTES,
};
use crate::dct;
use crate::entropy::{
    build_table_from_code_lengths, huff_decode, rle_decode_zeros, unpack_rle_symbols,
};
use crate::error::McodecError;
use crate::header::McodecHeader;
use crate::preprocess::inverse_level_shift;
use crate::quantize::dequantize;
use crate::Image;

/// Decodes a `.mcodec` byte buffer back into an image.
///
/// Reserved header flag bits are ignored; only bit 0 (level shift) is
/// interpreted. A buffer shorter than `header_bytes + payload_bytes`
/// fails with [`McodecError::PrematureEof`].
pub fn decode(bytes: &[u8]) -> Result<Image, McodecError> {
    let mut file = ByteReader::new(bytes.to_vec());
    let hdr = McodecHeader::read(&mut file)?;
    if hdr.channels != 1 {
        return Err(McodecError::NotGrayscale);
    }

    // Future revisions may grow the header; everything between the fixed
    // fields and the payload is skipped.
    let extension = usize::from(hdr.header_bytes) - usize::from(MCODEC_HEADER_BYTES);
    if extension > 0 {
        file.read_vec(extension)?;
    }
    let mut payload = ByteReader::new(file.read_vec(hdr.payload_bytes as usize)?);

    // Huffman table section.
    let symbol_count = payload.read_u32_le()? as usize;
    let used_symbol_count = payload.read_u32_le()? as usize;
    if used_symbol_count == 0 {
        return Err(McodecError::NoUsedSymbols);
    }
    if payload.remaining() < used_symbol_count * TABLE_RECORD_BYTES {
        return Err(McodecError::TruncatedTable);
    }
    let mut entries = Vec::with_capacity(used_symbol_count);
    for _ in 0..used_symbol_count {
        let symbol = payload.read_u32_le()?;
        let len = payload.read_u8()?;
        if len == 0 || len > MAXIMUM_CODE_LENGTH {
            return Err(McodecError::InvalidCodeLength);
        }
        entries.push((symbol, len));
    }
    let bits_len = payload.remaining();
    let bits = payload.read_vec(bits_len)?;

    // Entropy decode back to coefficient blocks.
    let table = build_table_from_code_lengths(&entries)?;
    let symbols = huff_decode(&bits, &table, symbol_count)?;
    let pairs = unpack_rle_symbols(&symbols);

    let grid = BlockGrid::new(hdr.width, hdr.height, hdr.block_size)?;
    let total_coeffs = grid.blocks_x * grid.blocks_y * grid.block_size * grid.block_size;
    let seq = rle_decode_zeros(&pairs, grid.block_size, total_coeffs)?;
    let qcoeffs = inverse_zigzag_blocks(&seq, grid.block_size)?;
    let coeffs = dequantize(&qcoeffs, grid.block_size, hdr.quality)?;
    let samples = dct::inverse_blocks(&coeffs, grid.block_size)?;

    let mut image = Image {
        width: hdr.width,
        height: hdr.height,
        channels: hdr.channels,
        bits_allocated: hdr.bits_allocated,
        bits_stored: hdr.bits_stored,
        is_signed: hdr.is_signed,
        pixels: Vec::new(),
    };
    untile_from_blocks(&mut image, &grid, &samples)?;

    if hdr.flags & FLAG_LEVEL_SHIFT != 0 {
        inverse_level_shift(&mut image)?;
    }

    if image.pixels.len() != image.width as usize * image.height as usize {
        return Err(McodecError::PixelCountMismatch);
    }
    Ok(image)
}
