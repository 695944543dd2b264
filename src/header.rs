//! Fixed 32-byte `.mcodec` container header.
//!
//! The header is always serialized field-by-field in little-endian order;
//! raw struct dumps are never used, so the wire layout is independent of
//! compiler padding.

use crate::bitstream::{ByteReader, ByteWriter};
use crate::constants::{MCODEC_HEADER_BYTES, MCODEC_MAGIC, MCODEC_VERSION};
use crate::error::McodecError;
use crate::Image;

/// Parsed `.mcodec` header, version 1.
///
/// Wire layout (offsets in bytes, all integers little-endian):
///
/// | Off | Size | Field          |
/// |-----|------|----------------|
/// | 0   | 4    | magic `MCDC`   |
/// | 4   | 2    | version        |
/// | 6   | 2    | header_bytes   |
/// | 8   | 4    | width          |
/// | 12  | 4    | height         |
/// | 16  | 2    | channels       |
/// | 18  | 2    | bits_allocated |
/// | 20  | 2    | bits_stored    |
/// | 22  | 1    | is_signed      |
/// | 23  | 1    | flags          |
/// | 24  | 2    | block_size     |
/// | 26  | 2    | quality        |
/// | 28  | 4    | payload_bytes  |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McodecHeader {
    pub version: u16,
    pub header_bytes: u16,
    pub width: u32,
    pub height: u32,
    pub channels: u16,
    pub bits_allocated: u16,
    pub bits_stored: u16,
    pub is_signed: bool,
    pub flags: u8,
    pub block_size: u16,
    pub quality: u16,
    pub payload_bytes: u32,
}

impl McodecHeader {
    /// Builds a version-1 header from the metadata of the image handed to
    /// the encoder. `is_signed` reflects the input image, not the
    /// level-shifted working copy; flag bit 0 records the shift instead.
    pub fn from_image(image: &Image, flags: u8, block_size: u16, quality: u16) -> Self {
        Self {
            version: MCODEC_VERSION,
            header_bytes: MCODEC_HEADER_BYTES,
            width: image.width,
            height: image.height,
            channels: image.channels,
            bits_allocated: image.bits_allocated,
            bits_stored: image.bits_stored,
            is_signed: image.is_signed,
            flags,
            block_size,
            quality,
            payload_bytes: 0,
        }
    }

    /// Serializes the header. `payload_bytes` is usually still zero at
    /// this point; the encoder patches it in place once the payload size
    /// is known.
    pub fn write(&self, w: &mut ByteWriter) {
        w.write_bytes(&MCODEC_MAGIC);
        w.write_u16_le(self.version);
        w.write_u16_le(self.header_bytes);
        w.write_u32_le(self.width);
        w.write_u32_le(self.height);
        w.write_u16_le(self.channels);
        w.write_u16_le(self.bits_allocated);
        w.write_u16_le(self.bits_stored);
        w.write_u8(u8::from(self.is_signed));
        w.write_u8(self.flags);
        w.write_u16_le(self.block_size);
        w.write_u16_le(self.quality);
        w.write_u32_le(self.payload_bytes);
    }

    /// Parses and validates a header from the front of `r`.
    ///
    /// Reserved flag bits are preserved as-is; only magic, version, and
    /// the header size field are rejected here.
    pub fn read(r: &mut ByteReader) -> Result<Self, McodecError> {
        let mut magic = [0u8; 4];
        r.read_bytes(&mut magic)?;
        if magic != MCODEC_MAGIC {
            return Err(McodecError::BadMagic);
        }
        let version = r.read_u16_le()?;
        if version != MCODEC_VERSION {
            return Err(McodecError::UnsupportedVersion);
        }
        let header_bytes = r.read_u16_le()?;
        if header_bytes < MCODEC_HEADER_BYTES {
            return Err(McodecError::InvalidHeaderBytes);
        }
        let width = r.read_u32_le()?;
        let height = r.read_u32_le()?;
        let channels = r.read_u16_le()?;
        let bits_allocated = r.read_u16_le()?;
        let bits_stored = r.read_u16_le()?;
        let is_signed = r.read_u8()? != 0;
        let flags = r.read_u8()?;
        let block_size = r.read_u16_le()?;
        let quality = r.read_u16_le()?;
        let payload_bytes = r.read_u32_le()?;

        Ok(Self {
            version,
            header_bytes,
            width,
            height,
            channels,
            bits_allocated,
            bits_stored,
            is_signed,
            flags,
            block_size,
            quality,
            payload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLAG_LEVEL_SHIFT;

    fn sample_image() -> Image {
        Image {
            width: 512,
            height: 384,
            channels: 1,
            bits_allocated: 16,
            bits_stored: 12,
            is_signed: false,
            pixels: Vec::new(),
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let mut hdr = McodecHeader::from_image(&sample_image(), FLAG_LEVEL_SHIFT, 8, 75);
        hdr.payload_bytes = 12345;

        let mut w = ByteWriter::new();
        hdr.write(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), usize::from(MCODEC_HEADER_BYTES));

        let parsed = McodecHeader::read(&mut ByteReader::new(bytes)).unwrap();
        assert_eq!(parsed, hdr);
    }

    #[test]
    fn test_field_offsets_little_endian() {
        let mut hdr = McodecHeader::from_image(&sample_image(), 0, 8, 50);
        hdr.payload_bytes = 0x0A0B0C0D;

        let mut w = ByteWriter::new();
        hdr.write(&mut w);
        let bytes = w.into_bytes();

        assert_eq!(&bytes[0..4], b"MCDC");
        assert_eq!(bytes[4], 1); // version lo
        assert_eq!(bytes[6], 32); // header_bytes lo
        assert_eq!(&bytes[8..12], &512u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &384u32.to_le_bytes());
        assert_eq!(&bytes[20..22], &12u16.to_le_bytes());
        assert_eq!(bytes[22], 0); // is_signed
        assert_eq!(&bytes[24..26], &8u16.to_le_bytes());
        assert_eq!(&bytes[26..28], &50u16.to_le_bytes());
        assert_eq!(&bytes[28..32], &0x0A0B0C0Du32.to_le_bytes());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut w = ByteWriter::new();
        McodecHeader::from_image(&sample_image(), 0, 8, 50).write(&mut w);
        let mut bytes = w.into_bytes();
        bytes[0] = b'X';
        assert_eq!(
            McodecHeader::read(&mut ByteReader::new(bytes)),
            Err(McodecError::BadMagic)
        );
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut w = ByteWriter::new();
        McodecHeader::from_image(&sample_image(), 0, 8, 50).write(&mut w);
        let mut bytes = w.into_bytes();
        bytes[4] = 2;
        assert_eq!(
            McodecHeader::read(&mut ByteReader::new(bytes)),
            Err(McodecError::UnsupportedVersion)
        );
    }

    #[test]
    fn test_undersized_header_bytes_rejected() {
        let mut w = ByteWriter::new();
        McodecHeader::from_image(&sample_image(), 0, 8, 50).write(&mut w);
        let mut bytes = w.into_bytes();
        bytes[6] = 16;
        assert_eq!(
            McodecHeader::read(&mut ByteReader::new(bytes)),
            Err(McodecError::InvalidHeaderBytes)
        );
    }

    #[test]
    fn test_truncated_header_is_premature_eof() {
        let mut w = ByteWriter::new();
        McodecHeader::from_image(&sample_image(), 0, 8, 50).write(&mut w);
        let mut bytes = w.into_bytes();
        bytes.truncate(20);
        assert_eq!(
            McodecHeader::read(&mut ByteReader::new(bytes)),
            Err(McodecError::PrematureEof)
        );
    }
}
