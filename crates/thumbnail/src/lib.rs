//! Thumbnail derivation library for GeoPhoto
//!
//! This crate produces bounded-size previews of uploaded photos. The long
//! edge is capped (256px by default), the source format is kept, and for
//! JPEG sources the original EXIF block is copied into the thumbnail so
//! viewers apply the same orientation and see the same GPS tags.
//!
//! Other formats (PNG, WebP, GIF, ...) are re-encoded from pixels only and
//! carry no metadata over; `ThumbnailInfo::exif_preserved` reports `false`
//! for them. Orientation tags on such sources are therefore not applied to
//! or kept on the thumbnail.

pub mod generate;
pub mod metadata;

pub use generate::{derive_thumbnail, resize_to_fit, ThumbnailInfo};
pub use metadata::{embed_exif, exif_payload};

use serde::{Deserialize, Serialize};

/// Thumbnail generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Upper bound for the longer of width and height
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_dimension: 256,
            jpeg_quality: 85,
        }
    }
}
