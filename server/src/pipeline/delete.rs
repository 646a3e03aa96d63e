//! Deletion: original, thumbnail and index entry, each attempted on its own.

use super::Library;
use geo_index::ImageId;
use serde::Serialize;

/// What was removed for one identifier. Absent artifacts are not errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    pub original_removed: bool,
    pub thumbnail_removed: bool,
    pub index_entry_removed: bool,
    /// Failures other than "already gone", one message per failed step.
    pub errors: Vec<String>,
}

impl DeletionOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeletionReport {
    pub deleted: Vec<(ImageId, DeletionOutcome)>,
    /// Names that are not valid identifiers and were not touched.
    pub rejected: Vec<String>,
}

impl DeletionReport {
    pub fn outcome(&self, id: &ImageId) -> Option<&DeletionOutcome> {
        self.deleted.iter().find(|(d, _)| d == id).map(|(_, o)| o)
    }

    pub fn errors(&self) -> usize {
        self.deleted.iter().map(|(_, o)| o.errors.len()).sum()
    }
}

impl Library {
    /// Remove every artifact of `id`. Idempotent; never propagates failures.
    ///
    /// The original goes first. Ingestion only indexes an id while its
    /// original exists, so removing it first stops a concurrent ingest from
    /// re-adding the entry after it has been deleted here.
    pub fn delete(&self, id: &ImageId) -> DeletionOutcome {
        let mut outcome = DeletionOutcome::default();

        match self.store.remove_original(id) {
            Ok(removed) => outcome.original_removed = removed,
            Err(e) => {
                tracing::warn!(image = %id, error = %e, "Failed to remove original");
                outcome.errors.push(format!("original: {}", e));
            }
        }

        match self.store.remove_thumbnail(id) {
            Ok(removed) => outcome.thumbnail_removed = removed,
            Err(e) => {
                tracing::warn!(image = %id, error = %e, "Failed to remove thumbnail");
                outcome.errors.push(format!("thumbnail: {}", e));
            }
        }

        match self.index.delete(id) {
            Ok(removed) => outcome.index_entry_removed = removed,
            Err(e) => {
                tracing::error!(image = %id, error = %e, "Failed to remove geo-index entry");
                outcome.errors.push(format!("index: {}", e));
            }
        }

        tracing::debug!(
            image = %id,
            original = outcome.original_removed,
            thumbnail = outcome.thumbnail_removed,
            index_entry = outcome.index_entry_removed,
            "Image deleted"
        );
        outcome
    }

    /// Delete each named image in order. Names that do not resolve to an
    /// identifier (traversal attempts, thumbnails, the index file) are skipped.
    pub fn delete_batch<S: AsRef<str>>(&self, names: &[S]) -> DeletionReport {
        let mut report = DeletionReport::default();

        for name in names {
            let name = name.as_ref();
            match self.store.resolve(name) {
                Some(id) => {
                    let outcome = self.delete(&id);
                    report.deleted.push((id, outcome));
                }
                None => {
                    tracing::warn!(name = %name, "Ignoring deletion of invalid image name");
                    report.rejected.push(name.to_string());
                }
            }
        }

        report
    }
}
