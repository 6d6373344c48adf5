//! Persistence boundary - normalized tag records
//!
//! Every accepted sample leaves the recorder as one [`TagRecord`]. Tag names
//! are percent-encoded here, at the boundary, so they can address files or
//! URLs; the in-memory registry always keys tags by their raw name.

use std::borrow::Cow;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::tag::TagAggregate;
use crate::Result;

/// Percent-encode a tag name for the persistence layer.
///
/// Everything except ASCII alphanumerics and `-_.~` is encoded, including
/// `/`.
#[must_use]
pub fn encode_tag(tag: &str) -> Cow<'_, str> {
    urlencoding::encode(tag)
}

/// Summary persisted alongside each sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TagSummary {
    /// Accepted samples so far.
    pub count: u64,
    /// Largest accepted value.
    pub max: Option<f64>,
    /// Smallest accepted value.
    pub min: Option<f64>,
}

impl From<TagAggregate> for TagSummary {
    fn from(agg: TagAggregate) -> Self {
        Self {
            count: agg.count(),
            max: agg.max(),
            min: agg.min(),
        }
    }
}

/// One accepted sample as handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    tag: String,
    value: f64,
    step: u64,
    sample_count: u64,
    summary: TagSummary,
}

impl TagRecord {
    /// Build a record for an accepted sample. `tag` is the raw tag name and
    /// is encoded here.
    #[must_use]
    pub fn new(tag: &str, value: f64, step: u64, aggregate: TagAggregate) -> Self {
        Self {
            tag: encode_tag(tag).into_owned(),
            value,
            step,
            sample_count: aggregate.count(),
            summary: aggregate.into(),
        }
    }

    /// Percent-encoded tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Recorded value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Step index.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Number of accepted samples including this one.
    #[must_use]
    pub const fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Tag summary after this sample.
    #[must_use]
    pub const fn summary(&self) -> &TagSummary {
        &self.summary
    }
}

/// Persistence layer receiving accepted samples.
pub trait TagPersistence: Send + Sync {
    /// Store one record.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` if the layer cannot accept the record.
    fn save_tag(&self, record: TagRecord) -> Result<()>;
}

/// In-memory persistence keyed by encoded tag.
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    records: DashMap<String, Vec<TagRecord>>,
}

impl MemoryTagStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records for an encoded tag key, ordered by step.
    #[must_use]
    pub fn records(&self, key: &str) -> Vec<TagRecord> {
        let mut records = self
            .records
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        records.sort_by_key(TagRecord::step);
        records
    }

    /// Latest record for an encoded tag key, in arrival order.
    ///
    /// The recorder saves under the tag lock, so arrival order is acceptance
    /// order and this record's summary covers every accepted sample.
    #[must_use]
    pub fn last(&self, key: &str) -> Option<TagRecord> {
        self.records
            .get(key)
            .and_then(|entry| entry.value().last().cloned())
    }

    /// Encoded tag keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.records.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Total number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TagPersistence for MemoryTagStore {
    fn save_tag(&self, record: TagRecord) -> Result<()> {
        self.records
            .entry(record.tag.clone())
            .or_default()
            .push(record);
        Ok(())
    }
}
