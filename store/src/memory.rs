//! In-memory store for testing.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Mutex;

use crate::{StateStore, StoreError};

/// Keeps the encoded snapshot in memory.
///
/// Encoding still goes through bincode so tests exercise the same
/// serialisation path as the file store.
#[derive(Default)]
pub struct MemoryStore {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Serialize + DeserializeOwned> StateStore<T> for MemoryStore {
    fn load(&self) -> Result<T, StoreError> {
        let guard = self
            .bytes
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))?;
        match guard.as_ref() {
            Some(bytes) => Ok(bincode::deserialize(bytes)?),
            None => Err(StoreError::NotFound("memory".into())),
        }
    }

    fn save(&self, state: &T) -> Result<(), StoreError> {
        let bytes = bincode::serialize(state)?;
        *self
            .bytes
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))? = Some(bytes);
        Ok(())
    }

    fn exists(&self) -> Result<bool, StoreError> {
        Ok(self
            .bytes
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))?
            .is_some())
    }
}
