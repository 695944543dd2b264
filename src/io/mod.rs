//! Image loading and saving collaborators.
//!
//! The codec core never touches the filesystem; these parsers and
//! serializers work on byte buffers, and the CLI owns the actual reads
//! and writes.

pub mod dicom;
pub mod pgm;

use std::path::Path;

use crate::error::McodecError;
use crate::Image;

/// Parses an input image, choosing the container by file extension:
/// `.pgm` is binary PGM, anything else is treated as DICOM.
pub fn parse_image(path: &Path, bytes: &[u8]) -> Result<Image, McodecError> {
    let is_pgm = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pgm"));
    if is_pgm {
        pgm::parse_pgm(bytes)
    } else {
        dicom::parse_dicom(bytes)
    }
}
