//! Visited flags that reset in O(1).
//!
//! [`EpochMarks`] stores one `u32` per item. An item is marked in the current
//! session iff its slot equals the session epoch, so starting a new session
//! only bumps the epoch instead of clearing every slot.
//!
//! The marks live outside the grid and belong to the caller, which keeps the
//! grid immutable and shareable across threads; each thread brings its own
//! marks.

/// Per-query visited flags keyed by dense indices.
///
/// # Example
///
/// ```
/// use cf_grid::EpochMarks;
///
/// let mut marks = EpochMarks::new();
/// marks.begin(4);
/// assert!(marks.mark(2));
/// assert!(!marks.mark(2));
///
/// // A new session forgets everything in O(1)
/// marks.begin(4);
/// assert!(!marks.is_marked(2));
/// ```
#[derive(Debug, Clone)]
pub struct EpochMarks {
    marks: Vec<u32>,
    epoch: u32,
}

impl EpochMarks {
    /// Creates empty marks with a pseudorandom starting epoch.
    #[must_use]
    pub fn new() -> Self {
        Self::with_epoch(rand::random())
    }

    /// Creates empty marks starting at a given epoch.
    ///
    /// Useful for reproducing a session in tests.
    #[must_use]
    pub fn with_epoch(epoch: u32) -> Self {
        Self {
            marks: Vec::new(),
            epoch: epoch.max(1),
        }
    }

    /// Starts a new session over `len` items.
    ///
    /// Storage only grows. When the epoch wraps around, every slot is cleared
    /// so a stale mark can never match a later session.
    pub fn begin(&mut self, len: usize) {
        if self.marks.len() < len {
            self.marks.resize(len, 0);
        }
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.marks.fill(0);
            self.epoch = 1;
        }
    }

    /// Marks item `index`. Returns `true` if it was not yet marked in this
    /// session.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the length passed to [`EpochMarks::begin`].
    pub fn mark(&mut self, index: usize) -> bool {
        let slot = &mut self.marks[index];
        if *slot == self.epoch {
            false
        } else {
            *slot = self.epoch;
            true
        }
    }

    /// Checks whether item `index` is marked in this session.
    #[must_use]
    pub fn is_marked(&self, index: usize) -> bool {
        self.marks.get(index).is_some_and(|&m| m == self.epoch)
    }

    /// Current session epoch. Never zero.
    #[must_use]
    pub const fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Number of slots currently allocated.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.marks.len()
    }
}

impl Default for EpochMarks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_are_independent() {
        let mut marks = EpochMarks::with_epoch(10);
        marks.begin(3);
        assert!(marks.mark(0));
        assert!(marks.is_marked(0));
        assert!(!marks.is_marked(1));

        marks.begin(3);
        assert!(!marks.is_marked(0));
        assert!(marks.mark(0));
    }

    #[test]
    fn test_storage_grows() {
        let mut marks = EpochMarks::with_epoch(1);
        marks.begin(2);
        assert!(marks.mark(1));
        marks.begin(10);
        assert_eq!(marks.capacity(), 10);
        assert!(marks.mark(9));
        assert!(!marks.is_marked(1));
        assert!(!marks.is_marked(100));
    }

    #[test]
    fn test_wrap_around_clears() {
        let mut marks = EpochMarks::with_epoch(u32::MAX - 1);
        marks.begin(2);
        assert_eq!(marks.epoch(), u32::MAX);
        assert!(marks.mark(0));

        marks.begin(2);
        assert_eq!(marks.epoch(), 1);
        assert!(!marks.is_marked(0));
        assert!(marks.mark(0));
        assert!(!marks.mark(0));
    }

    #[test]
    fn test_zero_epoch_is_skipped() {
        let marks = EpochMarks::with_epoch(0);
        assert_eq!(marks.epoch(), 1);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_mark_out_of_range_panics() {
        let mut marks = EpochMarks::with_epoch(5);
        marks.begin(1);
        marks.mark(1);
    }
}
