//! Zigzag scan order for quantized coefficient blocks.

use crate::error::McodecError;

/// Generates the `N x N` zigzag order as raster indices, walking the
/// anti-diagonals `s = 0..2(N-1)`: even diagonals bottom-to-top, odd
/// diagonals top-to-bottom. Entry `i` of the result is the raster index
/// scanned at position `i`.
pub fn make_zigzag_order(n: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(n * n);
    for s in 0..=2 * (n - 1) {
        if s % 2 == 0 {
            for x in 0..=s {
                let y = s - x;
                if x < n && y < n {
                    order.push(y * n + x);
                }
            }
        } else {
            for y in 0..=s {
                let x = s - y;
                if x < n && y < n {
                    order.push(y * n + x);
                }
            }
        }
    }
    order
}

fn check_block_size(block_size: usize) -> Result<(), McodecError> {
    if block_size != 8 && block_size != 16 {
        return Err(McodecError::InvalidBlockSize);
    }
    Ok(())
}

/// Permutes each block of `qcoeff` into zigzag order.
pub fn zigzag_scan_blocks(qcoeff: &[i16], block_size: usize) -> Result<Vec<i16>, McodecError> {
    check_block_size(block_size)?;
    let block_elems = block_size * block_size;
    if qcoeff.len() % block_elems != 0 {
        return Err(McodecError::InvalidBufferLength);
    }

    let order = make_zigzag_order(block_size);
    let mut seq = vec![0i16; qcoeff.len()];
    for (block_in, block_out) in qcoeff
        .chunks_exact(block_elems)
        .zip(seq.chunks_exact_mut(block_elems))
    {
        for (i, &raster) in order.iter().enumerate() {
            block_out[i] = block_in[raster];
        }
    }
    Ok(seq)
}

/// Undoes [`zigzag_scan_blocks`], restoring raster order per block.
pub fn inverse_zigzag_blocks(seq: &[i16], block_size: usize) -> Result<Vec<i16>, McodecError> {
    check_block_size(block_size)?;
    let block_elems = block_size * block_size;
    if seq.len() % block_elems != 0 {
        return Err(McodecError::InvalidBufferLength);
    }

    let order = make_zigzag_order(block_size);
    let mut qcoeff = vec![0i16; seq.len()];
    for (block_in, block_out) in seq
        .chunks_exact(block_elems)
        .zip(qcoeff.chunks_exact_mut(block_elems))
    {
        for (i, &raster) in order.iter().enumerate() {
            block_out[raster] = block_in[i];
        }
    }
    Ok(qcoeff)
}
