use crate::bitset::CaseSet;

/// Per-case counters of how many accepted rules cover each case.
///
/// A case is *uncovered* when its counter is zero. Adding and then removing the
/// same cover restores the previous state exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverCounts {
    counts: Vec<u32>,
}

impl CoverCounts {
    /// Creates zeroed counters for `num_cases` cases.
    #[must_use]
    pub fn new(num_cases: usize) -> Self {
        Self {
            counts: vec![0; num_cases],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Increments the counter of each case in `cover`.
    pub fn add(&mut self, cover: &CaseSet) {
        for case in cover.iter() {
            self.counts[case] += 1;
        }
    }

    /// Decrements the counter of each case in `cover`.
    ///
    /// # Panics
    ///
    /// Panics if a counter would go negative, which means `cover` was never
    /// added.
    pub fn remove(&mut self, cover: &CaseSet) {
        for case in cover.iter() {
            let count = &mut self.counts[case];
            assert!(*count > 0, "case {case} removed more often than added");
            *count -= 1;
        }
    }

    #[must_use]
    pub fn count(&self, case: usize) -> u32 {
        self.counts[case]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }

    /// Cases not covered by any accepted rule.
    #[must_use]
    pub fn uncovered(&self) -> CaseSet {
        CaseSet::from_indices(
            self.counts.len(),
            self.counts
                .iter()
                .enumerate()
                .filter(|&(_, &c)| c == 0)
                .map(|(case, _)| case),
        )
    }

    #[must_use]
    pub fn uncovered_count(&self) -> usize {
        self.counts.iter().filter(|&&c| c == 0).count()
    }
}
