//! Error types for allocation and sequencing.

use rega_types::{Range, TypesError, UserId};
use thiserror::Error;

/// Result type for allocation operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// Errors that block an allocation or a registration. None of these are
/// recoverable without an administrator changing the assignment.
#[derive(Debug, Error)]
pub enum AllocError {
    /// No further block fits after the highest one already issued.
    #[error("global pool exhausted: no block of {size} numbers fits after {last_end}")]
    RangeExhausted { last_end: i64, size: i64 },

    /// The requested block overlaps one held by another Registrador.
    #[error("range {requested} overlaps {held} held by {holder}")]
    RangeConflict {
        requested: Range,
        holder: UserId,
        held: Range,
    },

    /// Every number of the Registrador's block has been used.
    #[error("assigned range depleted: no numbers left up to {end}")]
    RangeDepleted { end: i64 },

    /// No interval of the global pool is selected.
    #[error("no global range pool is selected")]
    NoGlobalPool,

    /// The requested interval is not one of the offered blocks.
    #[error("range {0} is not in the catalogue")]
    NotInCatalogue(Range),

    #[error("user {0} is not a Registrador")]
    NotARegistrador(UserId),

    #[error("Registrador {0} has no range assigned")]
    NoRangeAssigned(UserId),

    #[error(transparent)]
    Types(#[from] TypesError),
}
