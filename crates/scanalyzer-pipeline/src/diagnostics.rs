//! Run summary: how many cells passed the reporting policy.

use serde::{Deserialize, Serialize};

use crate::area::{Areas, LeafStatus};

/// Cell counts for one run, by [`LeafStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Cells analyzed.
    pub cells: usize,
    /// Cells whose leaf exceeded the minimum area.
    pub valid: usize,
    /// Cells with a leaf at or under the minimum area.
    pub below_minimum: usize,
    /// Cells with no leaf region.
    pub empty: usize,
}

impl RunSummary {
    /// Tally a sequence of per-cell areas.
    pub fn tally<'a, I>(areas: I) -> Self
    where
        I: IntoIterator<Item = &'a Areas>,
    {
        areas.into_iter().fold(Self::default(), |mut acc, a| {
            acc.cells += 1;
            match a.status {
                LeafStatus::Valid => acc.valid += 1,
                LeafStatus::BelowMinimum => acc.below_minimum += 1,
                LeafStatus::Empty => acc.empty += 1,
            }
            acc
        })
    }

    /// One-line human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        format!(
            "{} cells: {} valid, {} below minimum leaf area, {} without a leaf",
            self.cells, self.valid, self.below_minimum, self.empty
        )
    }
}
