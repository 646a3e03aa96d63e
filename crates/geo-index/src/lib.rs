//! Persistent geo-index for GeoPhoto.
//!
//! Maps each uploaded image identifier to the decimal GPS position read from
//! its EXIF metadata. The index lives at `<upload dir>/GPSInfo.json` as a JSON
//! object of `{"<id>": {"latitude": .., "longitude": ..}}`.
//!
//! The whole map is held in memory. Mutations are serialized by a single
//! writer lock: each one builds the next map, flushes it to disk through a
//! temp file + rename, and only then publishes it to readers. Readers grab
//! the current snapshot and never see a half-applied change.

pub mod bbox;
pub mod id;

pub use bbox::BoundingBox;
pub use id::{is_thumbnail_name, IdError, ImageId, THUMBNAIL_MARKER};

use geotag::GeoPosition;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

type Entries = BTreeMap<ImageId, GeoPosition>;

/// Errors raised while persisting the index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("I/O error writing index {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// On-disk shape of one entry. Read leniently so a single bad record does not
/// take the whole index down.
#[derive(Deserialize)]
struct StoredPosition {
    latitude: f64,
    longitude: f64,
}

/// Lock-guarded image id → position map with write-through persistence.
pub struct GeoIndex {
    path: PathBuf,
    entries: RwLock<Arc<Entries>>,
    writer: Mutex<()>,
}

impl GeoIndex {
    /// Open the index stored at `path`.
    ///
    /// A missing file is a fresh index. An unreadable or corrupt file is
    /// logged and also treated as empty; the next successful write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        tracing::debug!(path = %path.display(), entries = entries.len(), "Geo-index loaded");

        Self {
            path,
            entries: RwLock::new(Arc::new(entries)),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace the position for `id`.
    pub fn put(&self, id: ImageId, position: GeoPosition) -> IndexResult<()> {
        self.put_if(id, position, || true).map(|_| ())
    }

    /// Insert or replace the position for `id` if `condition` holds.
    ///
    /// `condition` runs under the writer lock, so no other mutation can
    /// interleave between the check and the write. Returns whether the entry
    /// was written.
    pub fn put_if<F>(&self, id: ImageId, position: GeoPosition, condition: F) -> IndexResult<bool>
    where
        F: FnOnce() -> bool,
    {
        let _guard = self.writer.lock();
        if !condition() {
            return Ok(false);
        }

        let mut next = Entries::clone(&self.snapshot());
        next.insert(id, position);
        self.commit(next)?;
        Ok(true)
    }

    /// Remove `id` from the index. Returns whether an entry was removed;
    /// removing an absent id is a no-op and touches nothing on disk.
    pub fn delete(&self, id: &ImageId) -> IndexResult<bool> {
        let _guard = self.writer.lock();

        let current = self.snapshot();
        if !current.contains_key(id) {
            return Ok(false);
        }

        let mut next = Entries::clone(&current);
        next.remove(id);
        self.commit(next)?;
        Ok(true)
    }

    /// All ids whose position lies inside `bbox`, in identifier order.
    pub fn scan(&self, bbox: &BoundingBox) -> Vec<ImageId> {
        self.snapshot()
            .iter()
            .filter(|(_, position)| bbox.contains(position))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn get(&self, id: &ImageId) -> Option<GeoPosition> {
        self.snapshot().get(id).copied()
    }

    /// Copy of every entry, in identifier order.
    pub fn entries(&self) -> Vec<(ImageId, GeoPosition)> {
        self.snapshot()
            .iter()
            .map(|(id, position)| (id.clone(), *position))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Arc<Entries> {
        Arc::clone(&self.entries.read())
    }

    /// Flush `next` to disk, then publish it. Caller holds the writer lock.
    fn commit(&self, next: Entries) -> IndexResult<()> {
        self.flush(&next)?;
        *self.entries.write() = Arc::new(next);
        Ok(())
    }

    fn flush(&self, entries: &Entries) -> IndexResult<()> {
        let io_err = |source: io::Error| IndexError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, entries)?;
            writer.flush().map_err(io_err)?;
        }
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(&self.path).map_err(|e| io_err(e.error))?;

        tracing::debug!(path = %self.path.display(), entries = entries.len(), "Geo-index flushed");
        Ok(())
    }
}

fn load_entries(path: &Path) -> Entries {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Entries::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Geo-index unreadable, starting empty");
            return Entries::new();
        }
    };

    let stored: BTreeMap<String, StoredPosition> = match serde_json::from_slice(&data) {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Geo-index corrupt, starting empty");
            return Entries::new();
        }
    };

    let mut entries = Entries::new();
    for (name, raw) in stored {
        let id = match ImageId::parse(name) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping geo-index entry with invalid id");
                continue;
            }
        };
        match GeoPosition::new(raw.latitude, raw.longitude) {
            Ok(position) => {
                entries.insert(id, position);
            }
            Err(e) => {
                tracing::warn!(image = %id, error = %e, "Skipping geo-index entry with invalid position");
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn id(name: &str) -> ImageId {
        ImageId::parse(name).unwrap()
    }

    fn position(lat: f64, lon: f64) -> GeoPosition {
        GeoPosition::new(lat, lon).unwrap()
    }

    #[test]
    fn test_put_scan_delete_round_trip() {
        let temp_dir = tempdir().unwrap();
        let index = GeoIndex::open(temp_dir.path().join("GPSInfo.json"));
        let nyc = BoundingBox::new(40.0, 41.0, -74.0, -73.0);

        index.put(id("1-nyc.jpg"), position(40.5, -73.95)).unwrap();
        assert_eq!(index.scan(&nyc), vec![id("1-nyc.jpg")]);
        assert!(index.scan(&BoundingBox::new(0.0, 1.0, 0.0, 1.0)).is_empty());

        assert!(index.delete(&id("1-nyc.jpg")).unwrap());
        assert!(index.scan(&nyc).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_put_if_skips_write_when_condition_fails() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("GPSInfo.json");
        let index = GeoIndex::open(&path);

        assert!(!index.put_if(id("1-a.jpg"), position(1.0, 1.0), || false).unwrap());
        assert!(index.is_empty());
        assert!(!path.exists());

        assert!(index.put_if(id("1-a.jpg"), position(1.0, 1.0), || true).unwrap());
        assert_eq!(index.get(&id("1-a.jpg")), Some(position(1.0, 1.0)));
    }

    #[test]
    fn test_put_if_condition_runs_under_writer_lock() {
        let temp_dir = tempdir().unwrap();
        let index = GeoIndex::open(temp_dir.path().join("GPSInfo.json"));

        index
            .put_if(id("1-a.jpg"), position(1.0, 1.0), || index.writer.try_lock().is_none())
            .unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_put_is_last_write_wins() {
        let temp_dir = tempdir().unwrap();
        let index = GeoIndex::open(temp_dir.path().join("GPSInfo.json"));

        index.put(id("1-a.jpg"), position(10.0, 10.0)).unwrap();
        index.put(id("1-a.jpg"), position(-10.0, 20.0)).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&id("1-a.jpg")), Some(position(-10.0, 20.0)));
    }

    #[test]
    fn test_delete_twice_is_noop() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("GPSInfo.json");
        let index = GeoIndex::open(&path);
        index.put(id("1-keep.jpg"), position(1.0, 1.0)).unwrap();
        index.put(id("2-gone.jpg"), position(2.0, 2.0)).unwrap();

        assert!(index.delete(&id("2-gone.jpg")).unwrap());
        let on_disk = fs::read(&path).unwrap();

        assert!(!index.delete(&id("2-gone.jpg")).unwrap());
        assert_eq!(index.entries(), vec![(id("1-keep.jpg"), position(1.0, 1.0))]);
        assert_eq!(fs::read(&path).unwrap(), on_disk);
    }

    #[test]
    fn test_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("GPSInfo.json");

        {
            let index = GeoIndex::open(&path);
            index.put(id("1-a.jpg"), position(40.5, -73.95)).unwrap();
            index.put(id("2-b.jpg"), position(-33.86, 151.2)).unwrap();
        }

        let reopened = GeoIndex::open(&path);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get(&id("2-b.jpg")), Some(position(-33.86, 151.2)));
    }

    #[test]
    fn test_file_format() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("GPSInfo.json");
        let index = GeoIndex::open(&path);
        index.put(id("1-a.jpg"), position(40.5, -10.25)).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"1-a.jpg": {"latitude": 40.5, "longitude": -10.25}})
        );
    }

    #[test]
    fn test_corrupt_file_bootstraps_empty() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("GPSInfo.json");
        fs::write(&path, b"{not json").unwrap();

        let index = GeoIndex::open(&path);
        assert!(index.is_empty());

        index.put(id("1-a.jpg"), position(1.0, 2.0)).unwrap();
        assert_eq!(GeoIndex::open(&path).len(), 1);
    }

    #[test]
    fn test_invalid_records_are_skipped_on_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("GPSInfo.json");
        fs::write(
            &path,
            r#"{"1-ok.jpg":{"latitude":1,"longitude":2},
                "../escape.jpg":{"latitude":1,"longitude":2},
                "2-far.jpg":{"latitude":123,"longitude":2}}"#,
        )
        .unwrap();

        let index = GeoIndex::open(&path);
        assert_eq!(index.entries(), vec![(id("1-ok.jpg"), position(1.0, 2.0))]);
    }

    #[test]
    fn test_failed_flush_leaves_state_unchanged() {
        let temp_dir = tempdir().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();

        let index = GeoIndex::open(blocker.join("GPSInfo.json"));
        let err = index.put(id("1-a.jpg"), position(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, IndexError::Io { .. }));
        assert!(index.is_empty());
    }

    #[test]
    fn test_concurrent_puts_lose_nothing() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("GPSInfo.json");
        let index = GeoIndex::open(&path);
        let total = 64;

        std::thread::scope(|scope| {
            for i in 0..total {
                let index = &index;
                scope.spawn(move || {
                    let lat = (i as f64) - 32.0;
                    index
                        .put(id(&format!("{}-photo.jpg", i)), position(lat, lat * 2.0))
                        .unwrap();
                });
            }
        });

        let found = index.scan(&BoundingBox::world());
        assert_eq!(found.len(), total);
        assert_eq!(found.iter().collect::<HashSet<_>>().len(), total);

        // Disk agrees with memory
        assert_eq!(GeoIndex::open(&path).len(), total);
    }

    #[test]
    fn test_readers_see_whole_snapshots_during_writes() {
        let temp_dir = tempdir().unwrap();
        let index = GeoIndex::open(temp_dir.path().join("GPSInfo.json"));

        std::thread::scope(|scope| {
            let writer = scope.spawn(|| {
                for i in 0..40 {
                    index.put(id(&format!("{}-w.jpg", i)), position(0.0, 0.0)).unwrap();
                }
            });
            let mut last = 0;
            while !writer.is_finished() {
                let seen = index.scan(&BoundingBox::world()).len();
                assert!(seen >= last, "snapshots never go backwards");
                last = seen;
            }
        });

        assert_eq!(index.len(), 40);
    }
}
