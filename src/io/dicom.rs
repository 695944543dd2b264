//! Minimal DICOM loader for uncompressed single-frame monochrome images.
//!
//! Supports Part 10 files (128-byte preamble + `DICM`) carrying the
//! implicit or explicit VR little-endian transfer syntaxes. Encapsulated
//! (compressed) transfer syntaxes, multi-frame objects, and non-grayscale
//! photometric interpretations are rejected; convert those upstream.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::McodecError;
use crate::Image;

const IMPLICIT_VR_LE: &str = "1.2.840.10008.1.2";
const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";

const TAG_SAMPLES_PER_PIXEL: (u16, u16) = (0x0028, 0x0002);
const TAG_PHOTOMETRIC: (u16, u16) = (0x0028, 0x0004);
const TAG_NUMBER_OF_FRAMES: (u16, u16) = (0x0028, 0x0008);
const TAG_ROWS: (u16, u16) = (0x0028, 0x0010);
const TAG_COLUMNS: (u16, u16) = (0x0028, 0x0011);
const TAG_BITS_ALLOCATED: (u16, u16) = (0x0028, 0x0100);
const TAG_BITS_STORED: (u16, u16) = (0x0028, 0x0101);
const TAG_PIXEL_REPRESENTATION: (u16, u16) = (0x0028, 0x0103);
const TAG_PIXEL_DATA: (u16, u16) = (0x7FE0, 0x0010);

struct Element<'a> {
    tag: (u16, u16),
    value: &'a [u8],
}

/// Walks data elements off `bytes`, explicit or implicit VR little-endian.
struct ElementReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    explicit_vr: bool,
}

impl<'a> ElementReader<'a> {
    fn new(bytes: &'a [u8], explicit_vr: bool) -> Self {
        Self {
            bytes,
            pos: 0,
            explicit_vr,
        }
    }

    fn done(&self) -> bool {
        // A data element is at least tag + 4-byte length.
        self.pos + 8 > self.bytes.len()
    }

    fn next(&mut self) -> Result<Element<'a>, McodecError> {
        let b = self.bytes;
        let group = LittleEndian::read_u16(&b[self.pos..]);
        let element = LittleEndian::read_u16(&b[self.pos + 2..]);
        self.pos += 4;

        let len = if self.explicit_vr {
            let vr = &b[self.pos..self.pos + 2];
            self.pos += 2;
            match vr {
                b"OB" | b"OW" | b"OF" | b"SQ" | b"UT" | b"UN" => {
                    if self.pos + 6 > b.len() {
                        return Err(McodecError::MalformedDicom);
                    }
                    self.pos += 2; // reserved
                    let len = LittleEndian::read_u32(&b[self.pos..]);
                    self.pos += 4;
                    len
                }
                _ => {
                    if self.pos + 2 > b.len() {
                        return Err(McodecError::MalformedDicom);
                    }
                    let len = u32::from(LittleEndian::read_u16(&b[self.pos..]));
                    self.pos += 2;
                    len
                }
            }
        } else {
            let len = LittleEndian::read_u32(&b[self.pos..]);
            self.pos += 4;
            len
        };

        // Undefined lengths mark sequences or encapsulated pixel data.
        if len == 0xFFFF_FFFF {
            return Err(McodecError::UnsupportedDicom);
        }
        let len = len as usize;
        if self.pos + len > b.len() {
            return Err(McodecError::MalformedDicom);
        }
        let value = &b[self.pos..self.pos + len];
        self.pos += len;
        Ok(Element {
            tag: (group, element),
            value,
        })
    }
}

fn read_us(value: &[u8]) -> Result<u16, McodecError> {
    if value.len() < 2 {
        return Err(McodecError::MalformedDicom);
    }
    Ok(LittleEndian::read_u16(value))
}

/// UI/CS/IS values are ASCII, possibly padded with a space or NUL.
fn read_string(value: &[u8]) -> String {
    String::from_utf8_lossy(value)
        .trim_end_matches(['\0', ' '])
        .trim()
        .to_string()
}

/// Reads the file-meta group and returns the transfer syntax UID plus the
/// offset of the first dataset byte.
fn read_file_meta(bytes: &[u8]) -> Result<(String, usize), McodecError> {
    if bytes.len() < 132 + 12 || &bytes[128..132] != b"DICM" {
        return Err(McodecError::MalformedDicom);
    }

    // (0002,0000) UL: length of the remaining file-meta group.
    let mut reader = ElementReader::new(&bytes[132..], true);
    let first = reader.next()?;
    if first.tag != (0x0002, 0x0000) || first.value.len() != 4 {
        return Err(McodecError::MalformedDicom);
    }
    let meta_len = LittleEndian::read_u32(first.value) as usize;
    let meta_end = 132 + reader.pos + meta_len;
    if meta_end > bytes.len() {
        return Err(McodecError::MalformedDicom);
    }

    let mut meta = ElementReader::new(&bytes[132 + reader.pos..meta_end], true);
    let mut transfer_syntax = None;
    while !meta.done() {
        let element = meta.next()?;
        if element.tag == (0x0002, 0x0010) {
            transfer_syntax = Some(read_string(element.value));
        }
    }
    let uid = transfer_syntax.ok_or(McodecError::MalformedDicom)?;
    Ok((uid, meta_end))
}

/// Parses a single-frame uncompressed monochrome DICOM buffer.
pub fn parse_dicom(bytes: &[u8]) -> Result<Image, McodecError> {
    let (transfer_syntax, dataset_start) = read_file_meta(bytes)?;
    let explicit_vr = match transfer_syntax.as_str() {
        IMPLICIT_VR_LE => false,
        EXPLICIT_VR_LE => true,
        _ => return Err(McodecError::UnsupportedDicom),
    };

    let mut rows = None;
    let mut columns = None;
    let mut bits_allocated = None;
    let mut bits_stored = None;
    let mut pixel_representation = 0u16;
    let mut pixel_data: Option<&[u8]> = None;

    let mut reader = ElementReader::new(&bytes[dataset_start..], explicit_vr);
    while !reader.done() {
        let element = reader.next()?;
        match element.tag {
            TAG_SAMPLES_PER_PIXEL => {
                if read_us(element.value)? != 1 {
                    return Err(McodecError::UnsupportedDicom);
                }
            }
            TAG_PHOTOMETRIC => {
                if read_string(element.value) != "MONOCHROME2" {
                    return Err(McodecError::UnsupportedDicom);
                }
            }
            TAG_NUMBER_OF_FRAMES => {
                let frames: i64 = read_string(element.value)
                    .parse()
                    .map_err(|_| McodecError::MalformedDicom)?;
                if frames != 1 {
                    return Err(McodecError::UnsupportedDicom);
                }
            }
            TAG_ROWS => rows = Some(read_us(element.value)?),
            TAG_COLUMNS => columns = Some(read_us(element.value)?),
            TAG_BITS_ALLOCATED => bits_allocated = Some(read_us(element.value)?),
            TAG_BITS_STORED => bits_stored = Some(read_us(element.value)?),
            TAG_PIXEL_REPRESENTATION => pixel_representation = read_us(element.value)?,
            TAG_PIXEL_DATA => {
                pixel_data = Some(element.value);
                break;
            }
            _ => {}
        }
    }

    let rows = rows.ok_or(McodecError::MalformedDicom)?;
    let columns = columns.ok_or(McodecError::MalformedDicom)?;
    let bits_allocated = bits_allocated.ok_or(McodecError::MalformedDicom)?;
    let bits_stored = bits_stored.ok_or(McodecError::MalformedDicom)?;
    let pixel_data = pixel_data.ok_or(McodecError::MalformedDicom)?;

    if rows == 0 || columns == 0 {
        return Err(McodecError::MalformedDicom);
    }
    if bits_allocated != 8 && bits_allocated != 16 {
        return Err(McodecError::UnsupportedDicom);
    }
    if bits_stored == 0 || bits_stored > bits_allocated {
        return Err(McodecError::MalformedDicom);
    }
    let is_signed = pixel_representation == 1;

    let count = usize::from(rows) * usize::from(columns);
    let pixels: Vec<i32> = if bits_allocated == 8 {
        if pixel_data.len() < count {
            return Err(McodecError::MalformedDicom);
        }
        pixel_data[..count].iter().map(|&b| i32::from(b)).collect()
    } else {
        if pixel_data.len() < count * 2 {
            return Err(McodecError::MalformedDicom);
        }
        (0..count)
            .map(|i| {
                let word = LittleEndian::read_u16(&pixel_data[i * 2..]);
                if is_signed {
                    // Preserve the two's-complement bit pattern.
                    i32::from(word as i16)
                } else {
                    i32::from(word)
                }
            })
            .collect()
    };

    Ok(Image {
        width: u32::from(columns),
        height: u32::from(rows),
        channels: 1,
        bits_allocated,
        bits_stored,
        is_signed,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_explicit_short(out: &mut Vec<u8>, tag: (u16, u16), vr: &[u8; 2], value: &[u8]) {
        out.extend_from_slice(&tag.0.to_le_bytes());
        out.extend_from_slice(&tag.1.to_le_bytes());
        out.extend_from_slice(vr);
        out.extend_from_slice(&(value.len() as u16).to_le_bytes());
        out.extend_from_slice(value);
    }

    fn push_explicit_long(out: &mut Vec<u8>, tag: (u16, u16), vr: &[u8; 2], value: &[u8]) {
        out.extend_from_slice(&tag.0.to_le_bytes());
        out.extend_from_slice(&tag.1.to_le_bytes());
        out.extend_from_slice(vr);
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        out.extend_from_slice(value);
    }

    fn synthetic_dicom(transfer_syntax: &str, signed: bool, pixel_words: &[u16]) -> Vec<u8> {
        let mut file = vec![0u8; 128];
        file.extend_from_slice(b"DICM");

        let mut meta = Vec::new();
        push_explicit_short(&mut meta, (0x0002, 0x0010), b"UI", transfer_syntax.as_bytes());

        push_explicit_short(
            &mut file,
            (0x0002, 0x0000),
            b"UL",
            &(meta.len() as u32).to_le_bytes(),
        );
        file.extend_from_slice(&meta);

        let mut ds = Vec::new();
        push_explicit_short(&mut ds, TAG_SAMPLES_PER_PIXEL, b"US", &1u16.to_le_bytes());
        push_explicit_short(&mut ds, TAG_PHOTOMETRIC, b"CS", b"MONOCHROME2 ");
        push_explicit_short(&mut ds, TAG_ROWS, b"US", &2u16.to_le_bytes());
        push_explicit_short(&mut ds, TAG_COLUMNS, b"US", &2u16.to_le_bytes());
        push_explicit_short(&mut ds, TAG_BITS_ALLOCATED, b"US", &16u16.to_le_bytes());
        push_explicit_short(&mut ds, TAG_BITS_STORED, b"US", &12u16.to_le_bytes());
        push_explicit_short(
            &mut ds,
            TAG_PIXEL_REPRESENTATION,
            b"US",
            &u16::from(signed).to_le_bytes(),
        );
        let mut pixel_bytes = Vec::new();
        for &w in pixel_words {
            pixel_bytes.extend_from_slice(&w.to_le_bytes());
        }
        push_explicit_long(&mut ds, TAG_PIXEL_DATA, b"OW", &pixel_bytes);

        if transfer_syntax == IMPLICIT_VR_LE {
            // Rebuild the dataset without VR fields.
            let mut implicit = Vec::new();
            let mut reader = ElementReader::new(&ds, true);
            while !reader.done() {
                let e = reader.next().unwrap();
                implicit.extend_from_slice(&e.tag.0.to_le_bytes());
                implicit.extend_from_slice(&e.tag.1.to_le_bytes());
                implicit.extend_from_slice(&(e.value.len() as u32).to_le_bytes());
                implicit.extend_from_slice(e.value);
            }
            file.extend_from_slice(&implicit);
        } else {
            file.extend_from_slice(&ds);
        }
        file
    }

    #[test]
    fn test_parse_explicit_vr_unsigned() {
        let file = synthetic_dicom(EXPLICIT_VR_LE, false, &[0, 100, 4000, 4095]);
        let img = parse_dicom(&file).unwrap();
        assert_eq!((img.width, img.height), (2, 2));
        assert_eq!((img.bits_allocated, img.bits_stored), (16, 12));
        assert!(!img.is_signed);
        assert_eq!(img.pixels, vec![0, 100, 4000, 4095]);
    }

    #[test]
    fn test_parse_implicit_vr() {
        let file = synthetic_dicom(IMPLICIT_VR_LE, false, &[1, 2, 3, 4]);
        let img = parse_dicom(&file).unwrap();
        assert_eq!(img.pixels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_signed_pixels_preserve_bit_pattern() {
        // 0xFFFF is -1 as a signed 16-bit word.
        let file = synthetic_dicom(EXPLICIT_VR_LE, true, &[0xFFFF, 0x8000, 0, 42]);
        let img = parse_dicom(&file).unwrap();
        assert!(img.is_signed);
        assert_eq!(img.pixels, vec![-1, -32768, 0, 42]);
    }

    #[test]
    fn test_rejects_encapsulated_transfer_syntax() {
        let file = synthetic_dicom("1.2.840.10008.1.2.4.90", false, &[0; 4]);
        assert_eq!(parse_dicom(&file), Err(McodecError::UnsupportedDicom));
    }

    #[test]
    fn test_rejects_missing_magic() {
        assert_eq!(parse_dicom(&[0u8; 200]), Err(McodecError::MalformedDicom));
    }
}
