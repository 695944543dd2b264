//! Entropy coding: zero-run-length symbolization and canonical Huffman.

pub mod huffman;
pub mod rle;

pub use huffman::{build_table_from_code_lengths, huff_decode, huff_encode, HuffTable};
pub use rle::{pack_rle_symbols, rle_decode_zeros, rle_encode_zeros, unpack_rle_symbols, RlePair};
