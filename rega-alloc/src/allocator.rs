use crate::{AllocError, AllocResult};
use rega_types::{GlobalRangePool, Range, RangeCatalogue, User, UserId};
use tracing::{debug, info};

/// Assigns disjoint number blocks to Registradores.
///
/// The allocator only computes ranges. Writing the resulting
/// [`RoleAssignment`](rega_types::RoleAssignment) to the user record is up to
/// the caller, and must happen as a single update.
#[derive(Debug, Clone, Default)]
pub struct RangeAllocator {
    catalogue: RangeCatalogue,
}

impl RangeAllocator {
    #[must_use]
    pub fn new(catalogue: RangeCatalogue) -> Self {
        Self { catalogue }
    }

    /// The intervals offered for specific assignment.
    #[must_use]
    pub fn catalogue(&self) -> &RangeCatalogue {
        &self.catalogue
    }

    /// Blocks currently held by Registradores, sorted by end.
    ///
    /// Users with another role, or with incomplete range fields, hold nothing.
    #[must_use]
    pub fn occupied_ranges(users: &[User]) -> Vec<(&UserId, Range)> {
        let mut occupied: Vec<_> = users
            .iter()
            .filter_map(|u| u.assigned_range().map(|r| (&u.id, r)))
            .collect();
        occupied.sort_by_key(|(_, r)| (r.end(), r.start()));
        occupied
    }

    /// Appends a block the size of the selected pool interval after the
    /// highest block issued so far.
    ///
    /// With no Registrador holding a block, the first one starts at the pool
    /// interval's start.
    pub fn allocate_global(&self, pool: &GlobalRangePool, users: &[User]) -> AllocResult<Range> {
        let active = pool.selected().ok_or(AllocError::NoGlobalPool)?;
        let size = active.size();
        let last_end = match Self::occupied_ranges(users).last() {
            Some((_, r)) => Some(r.end()),
            None => active.start().checked_sub(1),
        };
        // Bounds from a corrupted pool entry can overflow either value.
        let exhausted = move || AllocError::RangeExhausted {
            last_end: last_end.unwrap_or(active.start()),
            size: size.unwrap_or(i64::MAX),
        };
        let (Some(last_end), Some(size)) = (last_end, size) else {
            return Err(exhausted());
        };

        if size <= 0 {
            return Err(exhausted());
        }
        let start = last_end.checked_add(1).ok_or_else(exhausted)?;
        if start <= last_end {
            return Err(exhausted());
        }
        let end = start.checked_add(size - 1).ok_or_else(exhausted)?;

        let range = Range::new(start, end)?;
        info!("Allocated {range} from global pool {active}");
        Ok(range)
    }

    /// Validates a catalogue interval for `target`.
    ///
    /// The interval must be in the catalogue and must not overlap a block
    /// held by any other Registrador. The target's own current block does not
    /// count, so re-assigning it is allowed.
    pub fn allocate_specific(
        &self,
        requested: Range,
        users: &[User],
        target: &UserId,
    ) -> AllocResult<Range> {
        if !self.catalogue.contains(&requested) {
            return Err(AllocError::NotInCatalogue(requested));
        }

        let conflict = Self::occupied_ranges(users)
            .into_iter()
            .filter(|(holder, _)| *holder != target)
            .find(|(_, held)| held.overlaps(&requested));
        if let Some((holder, held)) = conflict {
            debug!("Rejecting {requested} for {target}: held by {holder}");
            return Err(AllocError::RangeConflict {
                requested,
                holder: holder.clone(),
                held,
            });
        }

        info!("Allocated {requested} to {target}");
        Ok(requested)
    }
}
