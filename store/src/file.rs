//! File-backed store: one bincode-encoded snapshot per file.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{StateStore, StoreError};

/// Stores the snapshot at a fixed path.
///
/// Writes go to a sibling temp file which is then renamed over the target, so
/// a crash mid-write leaves the previous snapshot intact.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl<T: Serialize + DeserializeOwned> StateStore<T> for FileStore {
    fn load(&self) -> Result<T, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(bincode::deserialize(&bytes)?)
    }

    fn save(&self, state: &T) -> Result<(), StoreError> {
        let bytes = bincode::serialize(state)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.temp_path();
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "state saved");
        Ok(())
    }

    fn exists(&self) -> Result<bool, StoreError> {
        Ok(self.path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        counter: u64,
        members: Vec<(String, u128)>,
    }

    fn sample() -> Sample {
        Sample {
            counter: 7,
            members: vec![("a".into(), 1), ("b".into(), 2)],
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::new(dir.path().join("state.bin"));
        store.save(&sample()).unwrap();
        let loaded: Sample = store.load().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::new(dir.path().join("absent.bin"));
        let result: Result<Sample, _> = store.load();
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(!StateStore::<Sample>::exists(&store).unwrap());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::new(dir.path().join("nested/deeper/state.bin"));
        store.save(&sample()).unwrap();
        assert!(StateStore::<Sample>::exists(&store).unwrap());
    }

    #[test]
    fn overwrite_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::new(dir.path().join("state.bin"));
        store.save(&sample()).unwrap();
        let next = Sample {
            counter: 8,
            members: vec![],
        };
        store.save(&next).unwrap();
        let loaded: Sample = store.load().unwrap();
        assert_eq!(loaded, next);
        assert!(!dir.path().join("state.bin.tmp").exists());
    }

    #[test]
    fn corrupted_file_is_serialization_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("state.bin");
        fs::write(&path, [0xff, 0xff]).unwrap();
        let store = FileStore::new(path);
        let result: Result<Sample, _> = store.load();
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
