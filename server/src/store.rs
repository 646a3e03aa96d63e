//! On-disk image collection.
//!
//! Originals, their `-thumbnail` siblings and the geo-index file share one
//! flat directory. Uploads are written to a hidden temp file first and then
//! linked into place without clobbering, so a listed original is always
//! complete.

use chrono::Utc;
use geo_index::{is_thumbnail_name, ImageId};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Attempts at finding a free name for uploads sharing a millisecond and name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

pub struct ImageStore {
    root: PathBuf,
    index_file: String,
}

impl ImageStore {
    /// Open (creating if needed) the upload directory.
    pub fn open(root: impl AsRef<Path>, index_file: impl Into<String>) -> io::Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.canonicalize()?,
            index_file: index_file.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file)
    }

    pub fn original_path(&self, id: &ImageId) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn thumbnail_path(&self, id: &ImageId) -> PathBuf {
        self.root.join(id.thumbnail_name())
    }

    /// Turn a client-supplied name into an identifier, refusing anything that
    /// is not a valid original name (including the index file itself).
    pub fn resolve(&self, name: &str) -> Option<ImageId> {
        if name == self.index_file {
            return None;
        }
        ImageId::parse(name).ok()
    }

    /// Whether the original for `id` is present.
    pub fn contains(&self, id: &ImageId) -> bool {
        self.original_path(id).is_file()
    }

    /// Persist uploaded bytes under a fresh, collision-free identifier.
    pub fn persist_upload(&self, original_name: &str, data: &[u8]) -> io::Result<ImageId> {
        let millis = Utc::now().timestamp_millis();

        let mut temp = tempfile::NamedTempFile::new_in(&self.root)?;
        temp.write_all(data)?;
        temp.as_file().sync_all()?;

        for sequence in 0..MAX_NAME_ATTEMPTS {
            let id = ImageId::for_upload(millis, sequence, original_name);
            if id.as_str() == self.index_file {
                continue;
            }
            match temp.persist_noclobber(self.original_path(&id)) {
                Ok(_) => return Ok(id),
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => temp = e.file,
                Err(e) => return Err(e.error),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name for upload {:?}", original_name),
        ))
    }

    /// Identifiers of every stored original, sorted. Thumbnails, the index
    /// file and hidden temp files are left out.
    pub fn list(&self) -> io::Result<Vec<ImageId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name == self.index_file || is_thumbnail_name(&name) {
                continue;
            }
            if let Ok(id) = ImageId::parse(name) {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Remove the original. `Ok(false)` when it was already gone.
    pub fn remove_original(&self, id: &ImageId) -> io::Result<bool> {
        remove_if_present(&self.original_path(id))
    }

    /// Remove the thumbnail. `Ok(false)` when there was none.
    pub fn remove_thumbnail(&self, id: &ImageId) -> io::Result<bool> {
        remove_if_present(&self.thumbnail_path(id))
    }
}

fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, ImageStore) {
        let temp_dir = tempdir().unwrap();
        let store = ImageStore::open(temp_dir.path().join("uploads"), "GPSInfo.json").unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_persist_upload_prefixes_timestamp() {
        let (_temp_dir, store) = store();
        let id = store.persist_upload("beach.jpg", b"jpeg bytes").unwrap();

        let (millis, rest) = id.as_str().split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest, "beach.jpg");
        assert_eq!(fs::read(store.original_path(&id)).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn test_same_name_uploads_never_collide() {
        let (_temp_dir, store) = store();
        let ids: Vec<ImageId> = (0..20)
            .map(|i| store.persist_upload("same.jpg", format!("{}", i).as_bytes()).unwrap())
            .collect();

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 20);
        assert_eq!(store.list().unwrap().len(), 20);
    }

    #[test]
    fn test_list_skips_thumbnails_index_and_temp_files() {
        let (_temp_dir, store) = store();
        let id = store.persist_upload("a.jpg", b"a").unwrap();
        fs::write(store.thumbnail_path(&id), b"thumb").unwrap();
        fs::write(store.index_path(), b"{}").unwrap();
        fs::write(store.root().join(".tmpXYZ"), b"partial").unwrap();
        fs::create_dir(store.root().join("nested")).unwrap();

        assert_eq!(store.list().unwrap(), vec![id]);
    }

    #[test]
    fn test_resolve_refuses_index_and_traversal() {
        let (_temp_dir, store) = store();
        assert!(store.resolve("GPSInfo.json").is_none());
        assert!(store.resolve("../secret").is_none());
        assert!(store.resolve("1-a-thumbnail.jpg").is_none());
        assert_eq!(store.resolve("1-a.jpg").unwrap().as_str(), "1-a.jpg");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_temp_dir, store) = store();
        let id = store.persist_upload("a.jpg", b"a").unwrap();

        assert!(store.remove_original(&id).unwrap());
        assert!(!store.remove_original(&id).unwrap());
        assert!(!store.remove_thumbnail(&id).unwrap());
        assert!(!store.contains(&id));
    }
}
