//! Step Index Set - steps already recorded for one tag

use rustc_hash::FxHashSet;

/// Set of step indices accepted for a tag.
///
/// A step enters the set once and is never removed for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct StepIndexSet {
    steps: FxHashSet<u64>,
}

impl StepIndexSet {
    /// Create an empty step set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a step has already been recorded.
    #[must_use]
    pub fn contains(&self, step: u64) -> bool {
        self.steps.contains(&step)
    }

    /// Record a step. Returns `false` if it was already present.
    pub fn insert(&mut self, step: u64) -> bool {
        self.steps.insert(step)
    }

    /// Number of recorded steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if no step is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Recorded steps in ascending order.
    #[must_use]
    pub fn sorted(&self) -> Vec<u64> {
        let mut steps: Vec<u64> = self.steps.iter().copied().collect();
        steps.sort_unstable();
        steps
    }
}
