//! Ingestion: extract GPS → index → thumbnail, per persisted upload.

use super::Library;
use geo_index::ImageId;
use geotag::GeoPosition;
use rayon::prelude::*;
use serde::Serialize;

/// What happened to one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Indexed and thumbnailed.
    Indexed { position: GeoPosition },
    /// No usable GPS metadata; the original is kept, nothing else is created.
    NoPosition,
    /// Metadata could not be read at all; handled like `NoPosition`.
    ExtractionFailed { reason: String },
    /// The index write failed; no entry and no thumbnail were created.
    IndexFailed { reason: String },
    /// Indexed, but the thumbnail could not be derived.
    ThumbnailFailed { position: GeoPosition, reason: String },
    /// The original was deleted while being ingested; nothing was kept.
    Withdrawn,
}

impl IngestOutcome {
    /// The position stored in the index, if the file was indexed.
    pub fn position(&self) -> Option<GeoPosition> {
        match self {
            IngestOutcome::Indexed { position } | IngestOutcome::ThumbnailFailed { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.position().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestedFile {
    pub id: ImageId,
    #[serde(flatten)]
    pub outcome: IngestOutcome,
}

/// Per-file outcomes of one upload batch, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub files: Vec<IngestedFile>,
}

impl IngestReport {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn outcome(&self, id: &ImageId) -> Option<&IngestOutcome> {
        self.files.iter().find(|f| &f.id == id).map(|f| &f.outcome)
    }

    pub fn indexed(&self) -> usize {
        self.count(|o| o.is_indexed())
    }

    pub fn without_position(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::NoPosition))
    }

    /// Files deleted by a concurrent request before ingestion finished.
    pub fn withdrawn(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::Withdrawn))
    }

    pub fn thumbnail_failures(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::ThumbnailFailed { .. }))
    }

    /// Files whose metadata could not be read or whose index write failed.
    pub fn failures(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                IngestOutcome::ExtractionFailed { .. } | IngestOutcome::IndexFailed { .. }
            )
        })
    }

    fn count(&self, predicate: impl Fn(&IngestOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| predicate(&f.outcome)).count()
    }
}

impl Library {
    /// Run the ingestion steps for one persisted original.
    ///
    /// Never fails as a whole: every problem ends up in the returned outcome
    /// and in the log, and the original stays on disk.
    ///
    /// A concurrent [`Library::delete`] of the same id removes the original
    /// before the index entry and the thumbnail. The entry is only written
    /// while the original still exists (checked under the index writer lock),
    /// and a thumbnail whose original vanished meanwhile is removed again, so
    /// a racing deletion never leaves either artifact behind.
    pub fn ingest(&self, id: &ImageId) -> IngestOutcome {
        let original = self.store.original_path(id);

        let position = match geotag::read_gps(&original) {
            Ok(Some(position)) => position,
            Ok(None) => {
                tracing::info!(image = %id, "No GPS data found");
                return IngestOutcome::NoPosition;
            }
            Err(_) if !self.store.contains(id) => return self.withdrawn(id),
            Err(e) => {
                tracing::warn!(image = %id, error = %format!("{:#}", e), "GPS extraction failed");
                return IngestOutcome::ExtractionFailed {
                    reason: format!("{:#}", e),
                };
            }
        };

        match self
            .index
            .put_if(id.clone(), position, || self.store.contains(id))
        {
            Ok(true) => {}
            Ok(false) => return self.withdrawn(id),
            Err(e) => {
                tracing::error!(image = %id, error = %e, "Geo-index write failed");
                return IngestOutcome::IndexFailed {
                    reason: e.to_string(),
                };
            }
        }

        let target = self.store.thumbnail_path(id);
        let derived = thumbnail::derive_thumbnail(&original, &target, &self.thumbnails);

        if !self.store.contains(id) {
            if let Err(e) = self.store.remove_thumbnail(id) {
                tracing::warn!(image = %id, error = %e, "Failed to remove thumbnail of deleted image");
            }
            return self.withdrawn(id);
        }

        match derived {
            Ok(info) => {
                tracing::debug!(
                    image = %id,
                    width = info.width,
                    height = info.height,
                    exif_preserved = info.exif_preserved,
                    "Thumbnail derived"
                );
                IngestOutcome::Indexed { position }
            }
            Err(e) => {
                tracing::warn!(image = %id, error = %format!("{:#}", e), "Thumbnail derivation failed");
                IngestOutcome::ThumbnailFailed {
                    position,
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    fn withdrawn(&self, id: &ImageId) -> IngestOutcome {
        tracing::info!(image = %id, "Image deleted during ingestion");
        IngestOutcome::Withdrawn
    }

    /// Ingest a batch of persisted originals in parallel. One file's failure
    /// never affects its siblings.
    pub fn ingest_batch(&self, ids: &[ImageId]) -> IngestReport {
        let files = ids
            .par_iter()
            .map(|id| IngestedFile {
                id: id.clone(),
                outcome: self.ingest(id),
            })
            .collect();

        IngestReport { files }
    }
}
