//! Error types for the sync layer.

use rega_alloc::AllocError;
use rega_storage::StorageError;
use rega_types::{TypesError, UserId};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync and field operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote store could not be reached. Aborts the current pass.
    #[error("network error: {0}")]
    Network(String),

    /// The remote store rejected a single request.
    #[error("remote write failure: {0}")]
    Remote(String),

    /// The operation needs the backend and the device is offline.
    #[error("network unavailable")]
    NetworkUnavailable,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("allocation error: {0}")]
    Allocation(#[from] AllocError),

    #[error("invalid data: {0}")]
    Types(#[from] TypesError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A sync pass is already running.
    #[error("a sync pass is already in progress")]
    Busy,

    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A person with this document number is already registered.
    #[error("document {0} is already registered")]
    DuplicateDocument(String),
}

impl SyncError {
    /// Whether the error means the backend is unreachable rather than that
    /// it refused something.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::NetworkUnavailable)
    }
}
