use crate::{AllocError, AllocResult};
use rega_types::{Person, Range, User};

/// Computes the next number a Registrador stamps on a new person.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberSequencer;

impl NumberSequencer {
    /// Next free number in `user`'s block.
    ///
    /// One past the highest number this user already stamped inside the
    /// block, or the block cursor when none was stamped yet. Numbers from an
    /// earlier block are ignored.
    pub fn next_number(user: &User, persons: &[Person]) -> AllocResult<i64> {
        let range = Self::range_of(user)?;
        let next = Self::candidate(user, range, persons)?;
        if next > range.end() {
            return Err(AllocError::RangeDepleted { end: range.end() });
        }
        Ok(next)
    }

    /// How many numbers are still free above the highest one used.
    ///
    /// Saturates at `i64::MAX` for blocks wider than an `i64` can count.
    pub fn remaining(user: &User, persons: &[Person]) -> AllocResult<i64> {
        let range = Self::range_of(user)?;
        let next = Self::candidate(user, range, persons)?;
        Ok(range.end().saturating_sub(next).saturating_add(1).max(0))
    }

    fn range_of(user: &User) -> AllocResult<Range> {
        if !user.is_registrador() {
            return Err(AllocError::NotARegistrador(user.id.clone()));
        }
        user.assigned_range()
            .ok_or_else(|| AllocError::NoRangeAssigned(user.id.clone()))
    }

    fn candidate(user: &User, range: Range, persons: &[Person]) -> AllocResult<i64> {
        let highest = persons
            .iter()
            .filter(|p| p.registrado_por == user.id && range.contains(p.numero_asignado))
            .map(|p| p.numero_asignado)
            .max();

        match highest {
            Some(n) => n
                .checked_add(1)
                .ok_or(AllocError::RangeDepleted { end: range.end() }),
            None => Ok(user
                .current_number
                .unwrap_or(range.start())
                .clamp(range.start(), range.end())),
        }
    }
}
