//! Ingestion and deletion pipelines.
//!
//! [`Library`] owns the three artifacts of every image record (the original
//! file, its thumbnail and its geo-index entry) and is the only place that
//! creates or destroys them. The geo-index is reached exclusively through it.

pub mod delete;
pub mod ingest;

pub use delete::{DeletionOutcome, DeletionReport};
pub use ingest::{IngestOutcome, IngestReport, IngestedFile};

use crate::config::AppConfig;
use crate::store::ImageStore;
use anyhow::{Context, Result};
use geo_index::{BoundingBox, GeoIndex, ImageId};
use thumbnail::ThumbnailConfig;

pub struct Library {
    store: ImageStore,
    index: GeoIndex,
    thumbnails: ThumbnailConfig,
}

impl Library {
    pub fn new(store: ImageStore, index: GeoIndex, thumbnails: ThumbnailConfig) -> Self {
        Self {
            store,
            index,
            thumbnails,
        }
    }

    /// Open the upload directory and its geo-index as configured.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let store = ImageStore::open(&config.storage.upload_dir, config.storage.index_file.clone())
            .with_context(|| {
                format!(
                    "failed to open upload directory {}",
                    config.storage.upload_dir.display()
                )
            })?;
        let index = GeoIndex::open(store.index_path());

        tracing::info!(
            upload_dir = %store.root().display(),
            indexed = index.len(),
            "Image library opened"
        );

        Ok(Self::new(store, index, config.thumbnail.clone()))
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn index(&self) -> &GeoIndex {
        &self.index
    }

    /// Ids of indexed images whose position lies inside `bbox`.
    pub fn images_in(&self, bbox: &BoundingBox) -> Vec<ImageId> {
        self.index.scan(bbox)
    }
}
