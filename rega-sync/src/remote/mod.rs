//! Remote document store abstraction.
//!
//! The backend is a set of named collections of JSON documents. The core
//! never assumes reads observe its own writes.

mod http;
mod memory;

pub use http::{HttpDocumentStore, HttpStoreConfig};
pub use memory::MemoryDocumentStore;

use crate::error::SyncResult;
use async_trait::async_trait;
use rega_types::Document;
use serde_json::{Map, Value};

/// Networked document collections.
///
/// Implementations report unreachable backends as
/// [`SyncError::Network`](crate::SyncError::Network) and per-request
/// rejections as [`SyncError::Remote`](crate::SyncError::Remote).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of `collection` whose top-level `field` equals `equals`.
    async fn query(&self, collection: &str, field: &str, equals: &Value)
    -> SyncResult<Vec<Document>>;

    /// Stores a new document and returns its id.
    async fn insert(&self, collection: &str, data: Value) -> SyncResult<String>;

    /// Every document of `collection`.
    async fn get_all(&self, collection: &str) -> SyncResult<Vec<Document>>;

    /// One document by id.
    async fn get(&self, collection: &str, id: &str) -> SyncResult<Option<Document>>;

    /// Merges `patch` into an existing document's top-level fields as a
    /// single write.
    async fn update(&self, collection: &str, id: &str, patch: Map<String, Value>)
    -> SyncResult<()>;
}
