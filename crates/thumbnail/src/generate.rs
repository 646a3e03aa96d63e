//! Thumbnail derivation pipeline
//!
//! Decodes the source image with the `image` crate, shrinks it so the long
//! edge fits the configured bound, re-encodes it in the source's own format
//! and writes it atomically next to the original.

use crate::metadata::{embed_exif, exif_payload};
use crate::ThumbnailConfig;
use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

/// Summary of a derived thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub bytes: usize,
    /// Whether the source's EXIF block was carried over
    pub exif_preserved: bool,
}

/// Derive a thumbnail of `source` and write it to `target`
pub fn derive_thumbnail(source: &Path, target: &Path, config: &ThumbnailConfig) -> Result<ThumbnailInfo> {
    let data = fs::read(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;

    let reader = ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .with_context(|| format!("Failed to detect image format of {}", source.display()))?;
    let format = reader
        .format()
        .with_context(|| format!("Unrecognized image format: {}", source.display()))?;
    let img = reader
        .decode()
        .with_context(|| format!("Failed to decode {}", source.display()))?;

    let resized = resize_to_fit(img, config.max_dimension);
    let (width, height) = resized.dimensions();

    let mut encoded = encode(&resized, format, config.jpeg_quality)
        .with_context(|| format!("Failed to encode {:?} thumbnail for {}", format, source.display()))?;

    let mut exif_preserved = false;
    if format == ImageFormat::Jpeg {
        if let Some(tiff) = exif_payload(&data) {
            encoded = embed_exif(&encoded, tiff)?;
            exif_preserved = true;
        }
    }

    write_atomically(target, &encoded)?;

    Ok(ThumbnailInfo {
        width,
        height,
        format,
        bytes: encoded.len(),
        exif_preserved,
    })
}

/// Shrink `img` so its longer side is at most `max_dim`, preserving aspect ratio.
/// Images already within the bound are returned untouched.
pub fn resize_to_fit(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let max_existing = width.max(height);

    if max_dim == 0 || max_existing <= max_dim {
        return img;
    }

    let ratio = max_dim as f64 / max_existing as f64;
    let new_width = ((width as f64 * ratio).round() as u32).clamp(1, max_dim);
    let new_height = ((height as f64 * ratio).round() as u32).clamp(1, max_dim);

    img.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

fn encode(img: &DynamicImage, format: ImageFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    if format == ImageFormat::Jpeg {
        // The JPEG encoder has no alpha channel support
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
        rgb.write_with_encoder(encoder)?;
    } else {
        img.write_to(&mut Cursor::new(&mut buffer), format)?;
    }

    Ok(buffer)
}

fn write_atomically(target: &Path, data: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    temp.write_all(data)?;
    temp.persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write thumbnail: {}", target.display()))?;

    Ok(())
}
