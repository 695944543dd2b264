use thiserror::Error;

/// Error type shared by every stage of the codec.
///
/// All errors are fatal for the encode or decode call that raised them;
/// there is no retry or partial output.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum McodecError {
    // Argument validation
    #[error("Only grayscale (single channel) images are supported")]
    NotGrayscale,
    #[error("Image dimensions must be positive")]
    InvalidDimensions,
    #[error("Pixel buffer length does not match image dimensions")]
    PixelBufferMismatch,
    #[error("Buffer length is not a multiple of the block size")]
    InvalidBufferLength,
    #[error("Block size must be 8 or 16")]
    InvalidBlockSize,
    #[error("Quality must be between 1 and 100")]
    InvalidQuality,
    #[error("Bits stored must be between 1 and 16")]
    InvalidBitDepth,

    // Malformed container
    #[error("Premature end of stream")]
    PrematureEof,
    #[error("Bad magic bytes (expected MCDC)")]
    BadMagic,
    #[error("Unsupported container version")]
    UnsupportedVersion,
    #[error("Invalid header size field")]
    InvalidHeaderBytes,
    #[error("Huffman table section truncated")]
    TruncatedTable,
    #[error("Invalid Huffman code length in table section")]
    InvalidCodeLength,

    // Decode inconsistency
    #[error("Corrupt Huffman bitstream")]
    CorruptBitstream,
    #[error("Run-length output does not match the coefficient count")]
    RleLengthMismatch,
    #[error("Decoded pixel count mismatch")]
    PixelCountMismatch,

    // Encode overflow
    #[error("Symbol frequency overflow")]
    FrequencyOverflow,
    #[error("Huffman code length exceeds 32 bits")]
    CodeLengthOverflow,
    #[error("No used symbols for Huffman table")]
    NoUsedSymbols,
    #[error("Duplicate Huffman code assignment")]
    DuplicateCode,

    // Image loading
    #[error("Malformed PGM file")]
    MalformedPgm,
    #[error("Malformed DICOM file")]
    MalformedDicom,
    #[error("Unsupported DICOM file (compressed, multi-frame, or non-monochrome)")]
    UnsupportedDicom,
}
