//! Core data model for Rega.
//!
//! This crate defines the types shared by every layer of the field
//! registration core:
//! - [`Person`] records registered by field agents, keyed by document number
//! - [`User`] accounts with their [`Role`] and assigned number block
//! - [`Range`] values, the fixed [`RangeCatalogue`] and the [`GlobalRangePool`]
//! - [`Document`], the generic shape exchanged with the remote document store
//!
//! Field names on the wire follow the backend's camelCase JSON so that
//! records written by older clients decode unchanged.

mod document;
pub mod flag;
mod ids;
mod person;
mod range;
mod user;

pub use document::Document;
pub use ids::UserId;
pub use person::{DocumentType, Person, PersonDraft};
pub use range::{GlobalRangePool, PoolEntry, Range, RangeCatalogue};
pub use user::{Role, RoleAssignment, User};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, TypesError>;

/// Errors that can occur constructing or decoding model values.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid range {start}-{end}: start must not exceed end")]
    InvalidRange { start: i64, end: i64 },

    #[error("cannot parse range from {0:?}, expected \"start-end\"")]
    RangeFormat(String),

    #[error("{0} is not a candidate interval of the pool")]
    NotACandidate(Range),

    #[error("{0} pool intervals are flagged as selected, at most one is allowed")]
    MultipleSelectedPools(usize),

    #[error("invalid person draft: {0}")]
    InvalidDraft(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),
}
