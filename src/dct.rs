//! Orthonormal 2-D DCT-II and its inverse, applied per block.
//!
//! Both transforms run as separable 1-D passes in double precision over a
//! precomputed cosine table, so an unquantized forward/inverse round trip
//! reproduces the source integers exactly after rounding. Only the stored
//! coefficient buffer between the transform and the quantizer is single
//! precision.

use std::f64::consts::PI;
use std::sync::OnceLock;

use crate::error::McodecError;

/// Cosine table `cos[u * N + x] = cos((2x + 1) u pi / 2N)` and the
/// orthonormal scale factors `alpha[0] = sqrt(1/N)`, `alpha[k] = sqrt(2/N)`.
struct DctTables {
    n: usize,
    cos: Vec<f64>,
    alpha: Vec<f64>,
}

impl DctTables {
    fn build(n: usize) -> Self {
        let mut cos = vec![0.0f64; n * n];
        let mut alpha = vec![0.0f64; n];
        let factor = PI / (2.0 * n as f64);
        for u in 0..n {
            alpha[u] = if u == 0 {
                (1.0 / n as f64).sqrt()
            } else {
                (2.0 / n as f64).sqrt()
            };
            for x in 0..n {
                cos[u * n + x] = ((2 * x + 1) as f64 * u as f64 * factor).cos();
            }
        }
        Self { n, cos, alpha }
    }
}

static TABLES_8: OnceLock<DctTables> = OnceLock::new();
static TABLES_16: OnceLock<DctTables> = OnceLock::new();

fn tables_for(block_size: usize) -> Result<&'static DctTables, McodecError> {
    match block_size {
        8 => Ok(TABLES_8.get_or_init(|| DctTables::build(8))),
        16 => Ok(TABLES_16.get_or_init(|| DctTables::build(16))),
        _ => Err(McodecError::InvalidBlockSize),
    }
}

/// Forward DCT-II over a block-sequential sample buffer.
pub fn forward_blocks(samples: &[i32], block_size: usize) -> Result<Vec<f32>, McodecError> {
    let tables = tables_for(block_size)?;
    let n = tables.n;
    let block_elems = n * n;
    if samples.len() % block_elems != 0 {
        return Err(McodecError::InvalidBufferLength);
    }

    let mut coeffs = vec![0.0f32; samples.len()];
    let mut tmp = vec![0.0f64; block_elems];

    for (src, dst) in samples
        .chunks_exact(block_elems)
        .zip(coeffs.chunks_exact_mut(block_elems))
    {
        // Row pass: tmp[y][u] = alpha(u) * sum_x s[y][x] cos(u, x)
        for y in 0..n {
            for u in 0..n {
                let mut sum = 0.0f64;
                for x in 0..n {
                    sum += f64::from(src[y * n + x]) * tables.cos[u * n + x];
                }
                tmp[y * n + u] = sum * tables.alpha[u];
            }
        }
        // Column pass: dst[v][u] = alpha(v) * sum_y tmp[y][u] cos(v, y)
        for v in 0..n {
            for u in 0..n {
                let mut sum = 0.0f64;
                for y in 0..n {
                    sum += tmp[y * n + u] * tables.cos[v * n + y];
                }
                dst[v * n + u] = (sum * tables.alpha[v]) as f32;
            }
        }
    }
    Ok(coeffs)
}

/// Inverse DCT over a block-sequential coefficient buffer; rounds to the
/// nearest integer and clamps to the i32 range.
pub fn inverse_blocks(coeffs: &[f32], block_size: usize) -> Result<Vec<i32>, McodecError> {
    let tables = tables_for(block_size)?;
    let n = tables.n;
    let block_elems = n * n;
    if coeffs.len() % block_elems != 0 {
        return Err(McodecError::InvalidBufferLength);
    }

    let mut samples = vec![0i32; coeffs.len()];
    let mut tmp = vec![0.0f64; block_elems];

    for (src, dst) in coeffs
        .chunks_exact(block_elems)
        .zip(samples.chunks_exact_mut(block_elems))
    {
        // Column pass: tmp[y][u] = sum_v alpha(v) F[v][u] cos(v, y)
        for u in 0..n {
            for y in 0..n {
                let mut sum = 0.0f64;
                for v in 0..n {
                    sum += tables.alpha[v] * f64::from(src[v * n + u]) * tables.cos[v * n + y];
                }
                tmp[y * n + u] = sum;
            }
        }
        // Row pass: dst[y][x] = sum_u alpha(u) tmp[y][u] cos(u, x)
        for y in 0..n {
            for x in 0..n {
                let mut sum = 0.0f64;
                for u in 0..n {
                    sum += tables.alpha[u] * tmp[y * n + u] * tables.cos[u * n + x];
                }
                let rounded = sum.round();
                dst[y * n + x] = if rounded >= f64::from(i32::MAX) {
                    i32::MAX
                } else if rounded <= f64::from(i32::MIN) {
                    i32::MIN
                } else {
                    rounded as i32
                };
            }
        }
    }
    Ok(samples)
}
