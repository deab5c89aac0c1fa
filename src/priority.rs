//! Ordered tracking of occupied rule priorities.

use std::collections::BTreeSet;

/// Ordered set of rule priorities occupied during one reconciliation run.
///
/// Seeded with every priority the provider reported, then kept current while
/// the run frees slots (deletions) and reserves new ones (creations). Only
/// set semantics matter to the algorithm; the ordered backing lets
/// [`first_free_from`](PrioritySet::first_free_from) scan a contiguous span
/// of occupied values instead of probing one candidate at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrioritySet(BTreeSet<i64>);

impl PrioritySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether `priority` is currently occupied.
    pub fn contains(&self, priority: i64) -> bool {
        self.0.contains(&priority)
    }

    /// Mark `priority` as occupied. Returns `false` if it already was.
    pub fn insert(&mut self, priority: i64) -> bool {
        self.0.insert(priority)
    }

    /// Free `priority`. Removing an absent value is a no-op.
    pub fn remove(&mut self, priority: i64) -> bool {
        self.0.remove(&priority)
    }

    /// Number of occupied priorities.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no priority is occupied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowest unoccupied priority greater than or equal to `start`.
    ///
    /// Walks the occupied values from `start` upward; the first gap in the
    /// run is the answer. Never wraps.
    ///
    /// # Examples
    /// ```
    /// use fw_updater::priority::PrioritySet;
    /// let set: PrioritySet = [8000, 8001, 8003].into_iter().collect();
    /// assert_eq!(set.first_free_from(8000), 8002);
    /// assert_eq!(set.first_free_from(8004), 8004);
    /// ```
    pub fn first_free_from(&self, start: i64) -> i64 {
        let mut candidate = start;
        for &used in self.0.range(start..) {
            if used == candidate {
                candidate += 1;
            } else {
                break;
            }
        }
        candidate
    }
}

impl FromIterator<i64> for PrioritySet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
