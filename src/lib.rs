/*!
# mcodec-rs

`mcodec-rs` is a pure Rust baseline lossy codec for single-channel
(grayscale) medical images such as uncompressed CT/MR slices. It encodes
8..16-bit stored, signed or unsigned samples into a self-describing
`.mcodec` container using a JPEG-baseline-style pipeline: level shift,
block tiling, orthonormal 2-D DCT-II, uniform scalar quantization, zigzag
scan, zero-run-length coding, and canonical Huffman coding. Decoding runs
the exact inverse.

## Encoding

```rust
use mcodec_rs::{encode, Image};

let image = Image {
    width: 16,
    height: 16,
    channels: 1,
    bits_allocated: 8,
    bits_stored: 8,
    is_signed: false,
    pixels: vec![128; 256],
};
let bytes = encode(&image, 75).unwrap();
assert_eq!(&bytes[0..4], b"MCDC");
```

## Decoding

```rust
# use mcodec_rs::{encode, Image};
use mcodec_rs::decode;

# let image = Image { width: 16, height: 16, channels: 1, bits_allocated: 8,
#     bits_stored: 8, is_signed: false, pixels: vec![128; 256] };
# let bytes = encode(&image, 75).unwrap();
let decoded = decode(&bytes).unwrap();
assert_eq!(decoded.width, 16);
assert_eq!(decoded.bits_stored, 8);
```

## Containers

PGM (P5, 8/16-bit) and uncompressed single-frame monochrome DICOM
loaders plus a PGM saver live in [`io`]; they exchange the same [`Image`]
value the codec uses and never touch the filesystem themselves.

The codec core is single-threaded and synchronous. The only process-wide
state is a pair of lazily built, immutable DCT cosine tables, so
concurrent encode/decode calls from different threads are safe.
*/

pub mod bitstream;
pub mod block;
pub mod codec;
pub mod constants;
pub mod dct;
pub mod entropy;
pub mod error;
pub mod header;
pub mod io;
pub mod preprocess;
pub mod quantize;

pub use codec::{decode, encode};
pub use error::McodecError;
pub use header::McodecHeader;

/// A grayscale image exchanged between loaders, the codec, and savers.
///
/// `pixels` is row-major, one `i32` per sample, and every sample fits in
/// `bits_stored` bits under the `is_signed` interpretation. Loaders
/// produce it, the encoder consumes it immutably (mutating only an
/// internal working copy), and the decoder produces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Width in pixels. Must be positive.
    pub width: u32,
    /// Height in pixels. Must be positive.
    pub height: u32,
    /// Sample count per pixel; always 1 for this codec.
    pub channels: u16,
    /// Container word size per sample: 8 or 16.
    pub bits_allocated: u16,
    /// Meaningful bits per sample, `1..=bits_allocated` (e.g. 12 for CT).
    pub bits_stored: u16,
    /// Sign interpretation of the samples.
    pub is_signed: bool,
    /// Row-major samples, length `width * height`.
    pub pixels: Vec<i32>,
}

impl Image {
    /// Number of samples the dimensions call for.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Largest representable value of the unsigned sample domain,
    /// `2^bits_stored - 1`.
    pub fn max_sample_value(&self) -> i32 {
        (1i32 << self.bits_stored) - 1
    }
}
