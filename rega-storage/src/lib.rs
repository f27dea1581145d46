//! Local storage layer for Rega.
//!
//! The device keeps its replica as a handful of opaque blobs in a key/value
//! store: whole collections (`persons`, `users`, `departments`) serialized as
//! JSON, plus small scalars such as the signed-in user id and role.
//!
//! # Architecture
//!
//! - [`LocalStore`] is the raw contract: `get`/`put` of bytes, no
//!   transactions and no secondary indices.
//! - [`SqliteStore`] is the durable implementation, [`MemoryStore`] the
//!   process-local one.
//! - [`LocalCache`] layers typed collections on top and implements the
//!   fallback policy for read faults.
//!
//! Stores are constructed and injected by the composing application; there
//! is no process-wide instance.

mod cache;
mod error;
pub mod keys;
mod memory;
mod sqlite;

pub use cache::LocalCache;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A durable key/value store holding opaque blobs.
///
/// Callers serialize whole collections and are responsible for
/// read-modify-write correctness.
pub trait LocalStore: Send + Sync {
    /// Returns the blob stored under `key`, or `None` if nothing was written.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous blob.
    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()>;
}
