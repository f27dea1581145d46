//! Offline-first sync and field operations for Rega.
//!
//! # Architecture
//!
//! - [`remote::DocumentStore`] abstracts the backend's document collections;
//!   [`remote::HttpDocumentStore`] talks to a hub over HTTP and
//!   [`remote::MemoryDocumentStore`] keeps everything in process.
//! - [`Connectivity`] is consulted before any remote call so that passes
//!   degrade to local-only behaviour when offline.
//! - [`SyncEngine`] reconciles the local `persons` replica with the backend.
//! - [`FieldService`] is the surface used by the UI: range allocation,
//!   number sequencing, registration and sync for one [`Session`].
//!
//! # Example
//!
//! ```
//! use rega_storage::{LocalCache, MemoryStore};
//! use rega_sync::remote::MemoryDocumentStore;
//! use rega_sync::{AlwaysOnline, FieldService, Session, SyncConfig};
//! use rega_types::Role;
//! use std::sync::Arc;
//!
//! let cache = LocalCache::new(Arc::new(MemoryStore::new()));
//! let service = FieldService::new(
//!     Session::new("admin-1", Role::Administrador),
//!     cache,
//!     Arc::new(MemoryDocumentStore::new()),
//!     Arc::new(AlwaysOnline),
//!     SyncConfig::default(),
//! );
//! assert!(service.pending_persons().is_empty());
//! ```

mod connectivity;
mod engine;
mod error;
pub mod remote;
mod service;
mod session;

pub use connectivity::{AlwaysOnline, Connectivity, HttpProbe, ManualConnectivity};
pub use engine::{DirectoryReport, SyncConfig, SyncDownReport, SyncEngine, SyncUpReport};
pub use error::{SyncError, SyncResult};
pub use service::FieldService;
pub use session::Session;
