//! Canonical Huffman coding of packed RLE symbols.
//!
//! The container stores code *lengths* only; both sides derive the actual
//! codes with the same canonical assignment (sort by length then symbol,
//! numerically increasing codes, left shift across length jumps). Tree
//! construction therefore needs deterministic tie-breaks: equal
//! frequencies are ordered by the smallest symbol in the subtree, so two
//! conformant encoders emit identical length tables.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, BTreeMap, HashMap};

use crate::constants::MAXIMUM_CODE_LENGTH;
use crate::error::McodecError;

/// Canonical code for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeEntry {
    pub code: u32,
    pub len: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DecodeNode {
    left: Option<u32>,
    right: Option<u32>,
    symbol: Option<u32>,
}

/// Canonical Huffman table: an encoding map and the equivalent decode
/// trie. A symbol is "used" exactly when it is present in the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HuffTable {
    enc: HashMap<u32, CodeEntry>,
    nodes: Vec<DecodeNode>,
}

impl HuffTable {
    fn with_root() -> Self {
        Self {
            enc: HashMap::new(),
            nodes: vec![DecodeNode::default()],
        }
    }

    /// Number of distinct symbols in the table.
    pub fn used_symbols(&self) -> usize {
        self.enc.len()
    }

    pub fn code_for(&self, symbol: u32) -> Option<CodeEntry> {
        self.enc.get(&symbol).copied()
    }

    /// `(symbol, code_len)` records in the container's serialization
    /// order: code length ascending, then symbol ascending.
    pub fn sorted_code_lengths(&self) -> Vec<(u32, u8)> {
        let mut entries: Vec<(u32, u8)> = self.enc.iter().map(|(&s, e)| (s, e.len)).collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        entries
    }

    /// Registers a symbol's canonical code in the encoding map and walks
    /// it into the trie, MSB first (0 = left, 1 = right).
    fn insert_code(&mut self, symbol: u32, entry: CodeEntry) -> Result<(), McodecError> {
        self.enc.insert(symbol, entry);

        let mut node = 0usize;
        for i in (0..entry.len).rev() {
            let bit = (entry.code >> i) & 1;
            let child = if bit == 0 {
                self.nodes[node].left
            } else {
                self.nodes[node].right
            };
            node = match child {
                Some(idx) => idx as usize,
                None => {
                    let idx = self.nodes.len() as u32;
                    self.nodes.push(DecodeNode::default());
                    if bit == 0 {
                        self.nodes[node].left = Some(idx);
                    } else {
                        self.nodes[node].right = Some(idx);
                    }
                    idx as usize
                }
            };
        }
        if self.nodes[node].symbol.is_some() {
            return Err(McodecError::DuplicateCode);
        }
        self.nodes[node].symbol = Some(symbol);
        Ok(())
    }

    /// Decodes one symbol by walking the trie off `reader`.
    fn decode_symbol(&self, reader: &mut BitReader<'_>) -> Result<u32, McodecError> {
        let mut node = &self.nodes[0];
        loop {
            if let Some(symbol) = node.symbol {
                return Ok(symbol);
            }
            let bit = reader.read_bit()?;
            let child = if bit { node.right } else { node.left };
            match child {
                Some(idx) => node = &self.nodes[idx as usize],
                None => return Err(McodecError::CorruptBitstream),
            }
        }
    }
}

/// MSB-first bit packer; the final byte is zero-padded in its low bits.
#[derive(Default)]
pub struct BitWriter {
    data: Vec<u8>,
    cur: u8,
    bit_pos: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bits(&mut self, code: u32, len: u8) -> Result<(), McodecError> {
        if len == 0 || len > MAXIMUM_CODE_LENGTH {
            return Err(McodecError::InvalidCodeLength);
        }
        for i in (0..len).rev() {
            let bit = ((code >> i) & 1) as u8;
            self.cur = (self.cur << 1) | bit;
            self.bit_pos += 1;
            if self.bit_pos == 8 {
                self.data.push(self.cur);
                self.cur = 0;
                self.bit_pos = 0;
            }
        }
        Ok(())
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        if self.bit_pos > 0 {
            self.data.push(self.cur << (8 - self.bit_pos));
        }
        self.data
    }
}

/// MSB-first bit reader over a byte slice.
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_idx: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_idx: 0,
            bit_pos: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, McodecError> {
        let Some(&byte) = self.data.get(self.byte_idx) else {
            return Err(McodecError::PrematureEof);
        };
        let bit = (byte >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_idx += 1;
        }
        Ok(bit != 0)
    }
}

/// Counts symbol occurrences; the result is sparse `(symbol, freq)` pairs
/// with `freq > 0`, ascending by symbol.
pub fn build_symbol_frequencies(symbols: &[u32]) -> Result<Vec<(u32, u32)>, McodecError> {
    let mut freq = BTreeMap::new();
    for &s in symbols {
        let count: &mut u32 = freq.entry(s).or_insert(0);
        *count = count.checked_add(1).ok_or(McodecError::FrequencyOverflow)?;
    }
    Ok(freq.into_iter().collect())
}

struct HeapEntry {
    freq: u32,
    /// Smallest symbol in the subtree; the deterministic tie-break.
    symbol: u32,
    index: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.freq == other.freq && self.symbol == other.symbol
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.freq
            .cmp(&other.freq)
            .then_with(|| self.symbol.cmp(&other.symbol))
    }
}

struct TreeNode {
    symbol: u32,
    left: Option<usize>,
    right: Option<usize>,
}

/// Assigns canonical codes to entries already sorted by
/// `(len asc, symbol asc)`.
fn canonical_codes(sorted: &[(u32, u8)]) -> Vec<(u32, CodeEntry)> {
    let mut out = Vec::with_capacity(sorted.len());
    let mut code: u32 = 0;
    let mut prev_len = 0u8;
    for &(symbol, len) in sorted {
        code = code.wrapping_shl(u32::from(len - prev_len));
        prev_len = len;
        out.push((symbol, CodeEntry { code, len }));
        code += 1;
    }
    out
}

/// Builds a canonical table from sparse `(symbol, freq)` pairs.
///
/// Tree construction extracts the two minimum nodes from a min-heap over
/// `(freq, representative symbol)`; code lengths are leaf depths, capped
/// at 32.
pub fn build_canonical_table(sym_freq: &[(u32, u32)]) -> Result<HuffTable, McodecError> {
    let used: Vec<(u32, u32)> = sym_freq.iter().copied().filter(|&(_, f)| f > 0).collect();
    if used.is_empty() {
        return Err(McodecError::NoUsedSymbols);
    }

    // A single used symbol gets length 1 and code 0: the trie is a root
    // whose left child is the lone leaf.
    if used.len() == 1 {
        let mut table = HuffTable::with_root();
        table.insert_code(used[0].0, CodeEntry { code: 0, len: 1 })?;
        return Ok(table);
    }

    let mut arena: Vec<TreeNode> = Vec::with_capacity(used.len() * 2);
    let mut heap = BinaryHeap::with_capacity(used.len());
    for &(symbol, freq) in &used {
        arena.push(TreeNode {
            symbol,
            left: None,
            right: None,
        });
        heap.push(Reverse(HeapEntry {
            freq,
            symbol,
            index: arena.len() - 1,
        }));
    }

    while heap.len() > 1 {
        let Reverse(a) = heap.pop().ok_or(McodecError::CorruptBitstream)?;
        let Reverse(b) = heap.pop().ok_or(McodecError::CorruptBitstream)?;
        let freq = a
            .freq
            .checked_add(b.freq)
            .ok_or(McodecError::FrequencyOverflow)?;
        let symbol = a.symbol.min(b.symbol);
        arena.push(TreeNode {
            symbol,
            left: Some(a.index),
            right: Some(b.index),
        });
        heap.push(Reverse(HeapEntry {
            freq,
            symbol,
            index: arena.len() - 1,
        }));
    }
    let Reverse(root) = heap.pop().ok_or(McodecError::CorruptBitstream)?;

    // Leaf depths become code lengths.
    let mut lengths: Vec<(u32, u8)> = Vec::with_capacity(used.len());
    let mut stack = vec![(root.index, 0u8)];
    while let Some((index, depth)) = stack.pop() {
        let node = &arena[index];
        match (node.left, node.right) {
            (None, None) => lengths.push((node.symbol, depth)),
            (Some(left), Some(right)) => {
                if depth >= MAXIMUM_CODE_LENGTH {
                    return Err(McodecError::CodeLengthOverflow);
                }
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
            // Merged nodes always get two children.
            _ => return Err(McodecError::CorruptBitstream),
        }
    }

    lengths.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut table = HuffTable::with_root();
    for (symbol, entry) in canonical_codes(&lengths) {
        table.insert_code(symbol, entry)?;
    }
    Ok(table)
}

/// Rebuilds the canonical table from serialized `(symbol, code_len)`
/// records, exactly reproducing the encoder's codes.
pub fn build_table_from_code_lengths(entries: &[(u32, u8)]) -> Result<HuffTable, McodecError> {
    if entries.is_empty() {
        return Err(McodecError::NoUsedSymbols);
    }
    for &(_, len) in entries {
        if len == 0 || len > MAXIMUM_CODE_LENGTH {
            return Err(McodecError::InvalidCodeLength);
        }
    }

    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut table = HuffTable::with_root();
    for (symbol, entry) in canonical_codes(&sorted) {
        table.insert_code(symbol, entry)?;
    }
    Ok(table)
}

/// Encodes a symbol stream; returns the table and the MSB-first packed
/// bit bytes.
pub fn huff_encode(symbols: &[u32]) -> Result<(HuffTable, Vec<u8>), McodecError> {
    if symbols.is_empty() {
        return Err(McodecError::NoUsedSymbols);
    }
    let freqs = build_symbol_frequencies(symbols)?;
    let table = build_canonical_table(&freqs)?;

    let mut writer = BitWriter::new();
    for &s in symbols {
        let entry = table.code_for(s).ok_or(McodecError::CorruptBitstream)?;
        writer.write_bits(entry.code, entry.len)?;
    }
    Ok((table, writer.into_bytes()))
}

/// Decodes exactly `symbol_count` symbols by trie walk.
pub fn huff_decode(
    bits: &[u8],
    table: &HuffTable,
    symbol_count: usize,
) -> Result<Vec<u32>, McodecError> {
    let mut reader = BitReader::new(bits);
    let mut out = Vec::with_capacity(symbol_count);
    for _ in 0..symbol_count {
        out.push(table.decode_symbol(&mut reader)?);
    }
    Ok(out)
}
