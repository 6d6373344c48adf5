//! Tag Registry - step sets and aggregates for every tag of a run
//!
//! ## Locking
//!
//! Tags live in a `DashMap`. [`TagRegistry::with_tag`] holds the tag's entry
//! guard for the whole closure, so a duplicate check and the aggregate update
//! that follows it happen under one lock and concurrent producers cannot
//! both accept the same `(tag, step)`.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{StepIndexSet, TagAggregate};

/// Per-tag recording state.
#[derive(Debug, Clone, Default)]
pub struct TagState {
    steps: StepIndexSet,
    aggregate: TagAggregate,
}

impl TagState {
    /// Steps accepted so far.
    #[must_use]
    pub const fn steps(&self) -> &StepIndexSet {
        &self.steps
    }

    /// Running aggregate.
    #[must_use]
    pub const fn aggregate(&self) -> &TagAggregate {
        &self.aggregate
    }

    /// Step for the next sample: the explicit step if given, else the
    /// 1-based position after the accepted samples.
    #[must_use]
    pub fn next_index(&self, explicit: Option<u64>) -> u64 {
        explicit.unwrap_or(self.aggregate.count() + 1)
    }

    /// Check whether the step was already accepted.
    #[must_use]
    pub fn is_duplicate_step(&self, index: u64) -> bool {
        self.steps.contains(index)
    }

    /// Aggregate as it would be after accepting `value`. The state is not
    /// touched.
    #[must_use]
    pub fn preview(&self, value: f64) -> TagAggregate {
        let mut aggregate = self.aggregate;
        aggregate.update(value);
        aggregate
    }

    /// Record an accepted sample. Call exactly once per accepted sample,
    /// after validation succeeded.
    pub fn record_accepted(&mut self, index: u64, value: f64) -> TagAggregate {
        self.steps.insert(index);
        self.aggregate.update(value);
        self.aggregate
    }
}

/// Mapping tag → recording state for one run.
#[derive(Debug, Default)]
pub struct TagRegistry {
    tags: DashMap<String, TagState>,
}

impl TagRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the tag if unseen. Returns `true` if it was created.
    pub fn ensure_tag(&self, tag: &str) -> bool {
        self.ensure_tag_with(tag, || {})
    }

    /// Create the tag if unseen, running `on_create` while the new entry is
    /// still locked. Returns `true` if it was created.
    pub fn ensure_tag_with(&self, tag: &str, on_create: impl FnOnce()) -> bool {
        if self.tags.contains_key(tag) {
            return false;
        }
        match self.tags.entry(tag.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                let _guard = vacant.insert(TagState::default());
                on_create();
                true
            }
        }
    }

    /// Run `f` on the tag's state under its entry lock.
    ///
    /// Returns `None` if the tag is unknown.
    pub fn with_tag<R>(&self, tag: &str, f: impl FnOnce(&mut TagState) -> R) -> Option<R> {
        self.tags.get_mut(tag).map(|mut state| f(state.value_mut()))
    }

    /// Step for the next sample of `tag`. Unknown tags start at step 1.
    #[must_use]
    pub fn next_index(&self, tag: &str, explicit: Option<u64>) -> u64 {
        self.tags
            .get(tag)
            .map_or_else(|| explicit.unwrap_or(1), |state| state.next_index(explicit))
    }

    /// Check whether `index` was already accepted for `tag`.
    #[must_use]
    pub fn is_duplicate_step(&self, tag: &str, index: u64) -> bool {
        self.tags
            .get(tag)
            .is_some_and(|state| state.is_duplicate_step(index))
    }

    /// Record an accepted sample, creating the tag if needed.
    pub fn record_accepted(&self, tag: &str, index: u64, value: f64) -> TagAggregate {
        self.tags
            .entry(tag.to_string())
            .or_default()
            .record_accepted(index, value)
    }

    /// Aggregate snapshot for a tag.
    #[must_use]
    pub fn aggregate(&self, tag: &str) -> Option<TagAggregate> {
        self.tags.get(tag).map(|state| state.aggregate)
    }

    /// Accepted steps of a tag in ascending order.
    #[must_use]
    pub fn steps(&self, tag: &str) -> Option<Vec<u64>> {
        self.tags.get(tag).map(|state| state.steps.sorted())
    }

    /// Check whether a tag exists.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if the registry has no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// All tag names, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.tags.iter().map(|entry| entry.key().clone()).collect();
        tags.sort();
        tags
    }
}
