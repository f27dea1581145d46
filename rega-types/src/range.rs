//! Numeric ranges handed out to Registradores.

use crate::{Result, TypesError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An inclusive interval of assignable numbers.
///
/// Always satisfies `start <= end`, so a range holds at least one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct Range {
    start: i64,
    end: i64,
}

#[derive(Deserialize)]
struct RawRange {
    start: i64,
    end: i64,
}

impl TryFrom<RawRange> for Range {
    type Error = TypesError;

    fn try_from(raw: RawRange) -> Result<Self> {
        Range::new(raw.start, raw.end)
    }
}

impl Range {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start > end {
            return Err(TypesError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First number of the range.
    #[must_use]
    pub const fn start(&self) -> i64 {
        self.start
    }

    /// Last number of the range (inclusive).
    #[must_use]
    pub const fn end(&self) -> i64 {
        self.end
    }

    /// How many numbers the range holds, or `None` when the count does not
    /// fit in an `i64`.
    #[must_use]
    pub const fn size(&self) -> Option<i64> {
        match self.end.checked_sub(self.start) {
            Some(span) => span.checked_add(1),
            None => None,
        }
    }

    #[must_use]
    pub const fn contains(&self, n: i64) -> bool {
        self.start <= n && n <= self.end
    }

    /// Whether the two ranges share at least one number.
    #[must_use]
    pub const fn overlaps(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for Range {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| TypesError::RangeFormat(s.to_string()))?;
        let start = start
            .trim()
            .parse()
            .map_err(|_| TypesError::RangeFormat(s.to_string()))?;
        let end = end
            .trim()
            .parse()
            .map_err(|_| TypesError::RangeFormat(s.to_string()))?;
        Range::new(start, end)
    }
}

/// A fixed, ordered list of disjoint intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCatalogue {
    ranges: Vec<Range>,
}

impl RangeCatalogue {
    /// Width of each interval in the standard catalogue.
    pub const STANDARD_WIDTH: i64 = 100;
    /// Highest number covered by the standard catalogue.
    pub const STANDARD_LAST: i64 = 2000;

    /// Tiles `[first, last]` with consecutive intervals of `width` numbers.
    /// The final interval is truncated at `last` when the width does not divide
    /// the span evenly.
    pub fn tiled(first: i64, last: i64, width: i64) -> Result<Self> {
        if width <= 0 || first > last {
            return Err(TypesError::InvalidRange {
                start: first,
                end: last,
            });
        }
        let mut ranges = Vec::new();
        let mut start = first;
        while start <= last {
            let end = start.saturating_add(width - 1).min(last);
            ranges.push(Range { start, end });
            match end.checked_add(1) {
                Some(next) => start = next,
                None => break,
            }
        }
        Ok(Self { ranges })
    }

    /// The catalogue offered for specific assignments: `1-100`, `101-200`, …,
    /// `1901-2000`.
    #[must_use]
    pub fn standard() -> Self {
        let ranges = (0..Self::STANDARD_LAST / Self::STANDARD_WIDTH)
            .map(|i| Range {
                start: i * Self::STANDARD_WIDTH + 1,
                end: (i + 1) * Self::STANDARD_WIDTH,
            })
            .collect();
        Self { ranges }
    }

    #[must_use]
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    #[must_use]
    pub fn contains(&self, range: &Range) -> bool {
        self.ranges.contains(range)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl Default for RangeCatalogue {
    fn default() -> Self {
        Self::standard()
    }
}

/// One interval of the global pool as stored in the remote `config` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub start: i64,
    pub end: i64,
    /// Width of the interval, kept for older readers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<i64>,
    #[serde(default, with = "crate::flag")]
    pub is_selected: bool,
}

impl PoolEntry {
    /// Builds an entry for a candidate interval.
    #[must_use]
    pub fn new(range: Range, is_selected: bool) -> Self {
        Self {
            id: None,
            start: range.start(),
            end: range.end(),
            range: range.size(),
            is_selected,
        }
    }

    /// The interval this entry describes.
    pub fn as_range(&self) -> Result<Range> {
        Range::new(self.start, self.end)
    }
}

/// Candidate intervals for global-pool allocation plus the active one.
///
/// At most one interval is selected at a time; selecting another replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalRangePool {
    candidates: Vec<Range>,
    selected: Option<Range>,
}

impl GlobalRangePool {
    /// Creates a pool with no selection.
    #[must_use]
    pub fn new(candidates: Vec<Range>) -> Self {
        Self {
            candidates,
            selected: None,
        }
    }

    /// A pool over the standard catalogue.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(RangeCatalogue::standard().ranges().to_vec())
    }

    /// Rebuilds the pool from stored entries. Entries describing the same
    /// interval collapse into one candidate. More than one selected entry is
    /// a corrupted state and is rejected.
    pub fn from_entries(entries: &[PoolEntry]) -> Result<Self> {
        let mut candidates = Vec::with_capacity(entries.len());
        let mut selected = Vec::new();
        for entry in entries {
            let range = entry.as_range()?;
            candidates.push(range);
            if entry.is_selected {
                selected.push(range);
            }
        }
        if selected.len() > 1 {
            return Err(TypesError::MultipleSelectedPools(selected.len()));
        }
        candidates.sort();
        candidates.dedup();
        Ok(Self {
            candidates,
            selected: selected.first().copied(),
        })
    }

    /// Entries to persist, one per candidate.
    #[must_use]
    pub fn to_entries(&self) -> Vec<PoolEntry> {
        self.candidates
            .iter()
            .map(|r| PoolEntry::new(*r, self.selected == Some(*r)))
            .collect()
    }

    #[must_use]
    pub fn candidates(&self) -> &[Range] {
        &self.candidates
    }

    /// The active interval, if any.
    #[must_use]
    pub fn selected(&self) -> Option<Range> {
        self.selected
    }

    /// Makes `range` the active interval. It must be one of the candidates.
    pub fn select(&mut self, range: Range) -> Result<()> {
        if !self.candidates.contains(&range) {
            return Err(TypesError::NotACandidate(range));
        }
        self.selected = Some(range);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}
