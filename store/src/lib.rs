//! State persistence for concord engines.
//!
//! Engines hand a serialisable snapshot to a [`StateStore`]; the rest of the
//! codebase depends only on the trait. [`FileStore`] is the on-disk backend,
//! [`MemoryStore`] the in-memory one used by tests.

pub mod error;
pub mod file;
pub mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

/// A single-slot store holding the latest snapshot of type `T`.
pub trait StateStore<T> {
    /// Load the stored snapshot. Fails with [`StoreError::NotFound`] when nothing was saved.
    fn load(&self) -> Result<T, StoreError>;

    /// Replace the stored snapshot.
    fn save(&self, state: &T) -> Result<(), StoreError>;

    /// Whether a snapshot has been saved.
    fn exists(&self) -> Result<bool, StoreError>;
}
