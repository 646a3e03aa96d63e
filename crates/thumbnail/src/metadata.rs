//! JPEG EXIF segment helpers
//!
//! The `image` encoders drop embedded metadata. To keep a thumbnail's
//! orientation and GPS tags identical to the original, the source's EXIF
//! APP1 payload is copied byte for byte into the encoded output.

use anyhow::{bail, Result};

const MARKER_PREFIX: u8 = 0xFF;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP1: u8 = 0xE1;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Largest TIFF payload that fits one APP1 segment (length field is u16 and
/// counts itself plus the EXIF header)
pub const MAX_EXIF_PAYLOAD: usize = u16::MAX as usize - 2 - EXIF_HEADER.len();

/// Return the TIFF payload of the first EXIF APP1 segment in a JPEG stream
pub fn exif_payload(jpeg: &[u8]) -> Option<&[u8]> {
    if jpeg.len() < 4 || jpeg[0] != MARKER_PREFIX || jpeg[1] != SOI {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < jpeg.len() {
        if jpeg[pos] != MARKER_PREFIX {
            return None;
        }
        let marker = jpeg[pos + 1];
        // Fill bytes between segments
        if marker == MARKER_PREFIX {
            pos += 1;
            continue;
        }
        if marker == SOS || marker == EOI {
            return None;
        }
        // Standalone markers carry no length field
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }

        if pos + 4 > jpeg.len() {
            return None;
        }
        let length = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        if length < 2 || pos + 2 + length > jpeg.len() {
            return None;
        }

        let segment = &jpeg[pos + 4..pos + 2 + length];
        if marker == APP1 && segment.starts_with(EXIF_HEADER) {
            return Some(&segment[EXIF_HEADER.len()..]);
        }
        pos += 2 + length;
    }

    None
}

/// Insert an EXIF APP1 segment carrying `tiff` directly after the SOI marker
pub fn embed_exif(jpeg: &[u8], tiff: &[u8]) -> Result<Vec<u8>> {
    if jpeg.len() < 2 || jpeg[0] != MARKER_PREFIX || jpeg[1] != SOI {
        bail!("Not a JPEG stream: missing SOI marker");
    }
    if tiff.len() > MAX_EXIF_PAYLOAD {
        bail!(
            "EXIF payload too large for one APP1 segment: {} bytes (max {})",
            tiff.len(),
            MAX_EXIF_PAYLOAD
        );
    }

    let length = (2 + EXIF_HEADER.len() + tiff.len()) as u16;
    let mut output = Vec::with_capacity(jpeg.len() + 4 + EXIF_HEADER.len() + tiff.len());
    output.extend_from_slice(&[MARKER_PREFIX, SOI, MARKER_PREFIX, APP1]);
    output.extend_from_slice(&length.to_be_bytes());
    output.extend_from_slice(EXIF_HEADER);
    output.extend_from_slice(tiff);
    output.extend_from_slice(&jpeg[2..]);
    Ok(output)
}
