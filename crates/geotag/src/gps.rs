//! GPS position extraction from embedded EXIF metadata
//!
//! Only the four GPS fields needed for a position are consumed:
//! GPSLatitudeRef, GPSLatitude, GPSLongitudeRef and GPSLongitude. A file
//! missing any of them, or carrying values that do not form a valid position,
//! yields `Ok(None)`. `Err` is reserved for files whose metadata block cannot
//! be read at all (I/O failure, unknown container, corrupt TIFF structure).

use crate::coords::{Dms, GeoPosition, Hemisphere};
use anyhow::{Context, Result};
use exif::{Exif, Field, In, Tag, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;

/// Read the GPS position embedded in an image file
pub fn read_gps(path: &Path) -> Result<Option<GeoPosition>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let exif = read_exif(&mut reader)
        .with_context(|| format!("Failed to read EXIF metadata from {}", path.display()))?;

    Ok(exif.as_ref().and_then(position_from_exif))
}

/// Read the GPS position from an in-memory image
pub fn read_gps_from_bytes(bytes: &[u8]) -> Result<Option<GeoPosition>> {
    let mut reader = Cursor::new(bytes);
    let exif = read_exif(&mut reader)?;
    Ok(exif.as_ref().and_then(position_from_exif))
}

/// Build a position from parsed EXIF fields, if all four GPS fields are present
/// and well-formed
pub fn position_from_exif(exif: &Exif) -> Option<GeoPosition> {
    let latitude = coordinate(exif, Tag::GPSLatitudeRef, Tag::GPSLatitude)?;
    let longitude = coordinate(exif, Tag::GPSLongitudeRef, Tag::GPSLongitude)?;
    GeoPosition::from_dms(&latitude, &longitude).ok()
}

fn read_exif<R: BufRead + Seek>(reader: &mut R) -> Result<Option<Exif>> {
    let mut exif_reader = exif::Reader::new();
    // Tolerate non-standard vendor blocks; the GPS IFD is usually intact
    exif_reader.continue_on_error(true);

    match exif_reader.read_from_container(reader) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::PartialResult(partial)) => {
            let (exif, _errors) = partial.into_inner();
            Ok(Some(exif))
        }
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(e) => Err(anyhow::Error::new(e)),
    }
}

fn coordinate(exif: &Exif, ref_tag: Tag, value_tag: Tag) -> Option<Dms> {
    let hemisphere = hemisphere_of(exif.get_field(ref_tag, In::PRIMARY)?)?;
    let [degrees, minutes, seconds] = dms_components(exif.get_field(value_tag, In::PRIMARY)?)?;
    Some(Dms::new(hemisphere, degrees, minutes, seconds))
}

fn hemisphere_of(field: &Field) -> Option<Hemisphere> {
    match &field.value {
        Value::Ascii(values) => {
            let letter = values.first()?.first()?;
            Hemisphere::from_letter(*letter as char)
        }
        _ => None,
    }
}

fn dms_components(field: &Field) -> Option<[f64; 3]> {
    let values: Vec<f64> = match &field.value {
        Value::Rational(values) => values.iter().map(|r| r.to_f64()).collect(),
        Value::SRational(values) => values.iter().map(|r| r.to_f64()).collect(),
        _ => return None,
    };

    if values.len() < 3 || values[..3].iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }
    Some([values[0], values[1], values[2]])
}
