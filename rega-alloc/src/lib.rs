//! Number block allocation for Rega.
//!
//! Two pure components, both operating on a caller-supplied view of users and
//! persons (no I/O):
//!
//! - [`RangeAllocator`] hands out disjoint `[numberInit, numberEnd]` blocks to
//!   Registradores, either appended after the highest block already issued
//!   from the global pool or picked from the fixed catalogue.
//! - [`NumberSequencer`] computes the next free number inside a
//!   Registrador's block from the persons already registered locally.
//!
//! Freshness of the view is the caller's concern: allocating against a stale
//! user list, or sequencing against a persons cache that has not been merged
//! with the backend, can hand out numbers that are already taken.

mod allocator;
mod error;
mod sequencer;

pub use allocator::RangeAllocator;
pub use error::{AllocError, AllocResult};
pub use sequencer::NumberSequencer;
