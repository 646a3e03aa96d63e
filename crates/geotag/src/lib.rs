//! Geographic tagging primitives for GeoPhoto
//!
//! This crate converts degree/minute/second coordinates to signed decimal
//! degrees and extracts GPS positions from image EXIF metadata.

pub mod coords;
pub mod gps;

pub use coords::{to_decimal, Dms, GeoPosition, Hemisphere};
pub use gps::{position_from_exif, read_gps, read_gps_from_bytes};
