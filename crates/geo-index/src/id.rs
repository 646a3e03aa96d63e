//! Image identifiers and the names derived from them.

use serde::Serialize;
use std::fmt;

/// Marker inserted before the extension of a thumbnail file name.
pub const THUMBNAIL_MARKER: &str = "-thumbnail";

/// Errors for names that cannot identify a stored image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("image identifier is empty")]
    Empty,

    #[error("image identifier contains a path component: {0}")]
    PathComponent(String),

    #[error("image identifier is hidden: {0}")]
    Hidden(String),

    #[error("image identifier uses the reserved thumbnail marker: {0}")]
    Reserved(String),
}

/// Identifier of an uploaded image: the file name of the original in the
/// upload directory.
///
/// A valid identifier is a single non-hidden path component whose stem does
/// not end with [`THUMBNAIL_MARKER`], so original and thumbnail names can
/// never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn parse(name: impl Into<String>) -> Result<Self, IdError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdError::Empty);
        }
        if name.contains(['/', '\\', '\0']) || name == ".." {
            return Err(IdError::PathComponent(name));
        }
        if name.starts_with('.') {
            return Err(IdError::Hidden(name));
        }
        if is_thumbnail_name(&name) {
            return Err(IdError::Reserved(name));
        }
        Ok(Self(name))
    }

    /// Build the identifier for a freshly uploaded file.
    ///
    /// The client-supplied name is reduced to its final path component and
    /// restricted to `[A-Za-z0-9._-]`, then prefixed with the upload time in
    /// milliseconds. A non-zero `sequence` disambiguates uploads that land in
    /// the same millisecond with the same name.
    pub fn for_upload(millis: i64, sequence: u32, original_name: &str) -> Self {
        let name = sanitize(original_name);
        if sequence == 0 {
            Self(format!("{}-{}", millis, name))
        } else {
            Self(format!("{}-{}-{}", millis, sequence, name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name without its extension (everything before the last dot).
    pub fn stem(&self) -> &str {
        split_extension(&self.0).0
    }

    pub fn extension(&self) -> Option<&str> {
        split_extension(&self.0).1
    }

    /// File name of the derived thumbnail: the marker goes before the last
    /// dot, or at the end when there is no extension.
    pub fn thumbnail_name(&self) -> String {
        match self.extension() {
            Some(ext) => format!("{}{}.{}", self.stem(), THUMBNAIL_MARKER, ext),
            None => format!("{}{}", self.0, THUMBNAIL_MARKER),
        }
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ImageId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether a file name follows the thumbnail naming convention.
pub fn is_thumbnail_name(name: &str) -> bool {
    split_extension(name).0.ends_with(THUMBNAIL_MARKER)
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
    }
}

fn sanitize(original_name: &str) -> String {
    let last = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "image".to_string();
    }
    if is_thumbnail_name(cleaned) {
        return match split_extension(cleaned) {
            (stem, Some(ext)) => format!("{}_.{}", stem, ext),
            (stem, None) => format!("{}_", stem),
        };
    }
    cleaned.to_string()
}
