//! Reusable per-query bookkeeping.

use cf_grid::EpochMarks;

/// Visited flags for cells and faces.
///
/// Every query starts a fresh session on the marks it uses, so one scratch
/// can serve any number of queries in sequence. Keep one per thread to run
/// queries on a shared [`Collider`](crate::Collider) concurrently.
#[derive(Debug, Clone, Default)]
pub struct QueryScratch {
    pub(crate) cells: EpochMarks,
    pub(crate) faces: EpochMarks,
}

impl QueryScratch {
    /// Creates empty scratch space with random starting epochs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates scratch space with fixed starting epochs.
    #[must_use]
    pub fn with_epoch(epoch: u32) -> Self {
        Self {
            cells: EpochMarks::with_epoch(epoch),
            faces: EpochMarks::with_epoch(epoch),
        }
    }
}
