//! Chart sink - per-tag value type validation
//!
//! The recorder hands every tag's first value to a [`ChartSink`] so the sink
//! can fix the tag's chart kind, then asks it to convert each accepted
//! sample. A sink may mark a tag as permanently errored (for example when
//! incompatible kinds are mixed under one tag); the recorder drops every
//! later sample for such a tag.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::{Error, Result};

/// Chart kind a tag is rendered as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartKind {
    /// Scalar line chart.
    Line,
    /// Histogram chart.
    Histogram,
    /// Kind defined by an external payload type.
    Custom(String),
}

/// Validator/converter for tag values.
pub trait ChartSink: Send + Sync {
    /// Register a tag with its first value. Called once per tag.
    fn register(&self, tag: &str, initial: &Value);

    /// Whether the tag has been marked as permanently errored.
    fn is_errored(&self, tag: &str) -> bool;

    /// Convert an accepted sample's numeric value.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConversionRejected` if the sink refuses the value.
    fn try_convert(&self, tag: &str, value: &Value, numeric: f64) -> Result<f64>;
}

#[derive(Debug, Clone)]
struct ChartEntry {
    kind: ChartKind,
    errored: bool,
}

/// In-memory chart table keyed by tag.
///
/// The first registered value fixes a tag's kind. A later sample of another
/// kind errors the tag for the rest of the run; a non-finite value on a line
/// chart is refused without erroring the tag.
#[derive(Debug, Default)]
pub struct ChartTable {
    charts: DashMap<String, ChartEntry>,
}

impl ChartTable {
    /// Create an empty chart table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kind registered for a tag.
    #[must_use]
    pub fn kind_of(&self, tag: &str) -> Option<ChartKind> {
        self.charts.get(tag).map(|entry| entry.kind.clone())
    }

    /// Number of registered charts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.charts.len()
    }

    /// Check if no chart is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Tags currently marked as errored, sorted.
    #[must_use]
    pub fn errored_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .charts
            .iter()
            .filter(|entry| entry.errored)
            .map(|entry| entry.key().clone())
            .collect();
        tags.sort();
        tags
    }

    fn reject(tag: &str, reason: impl Into<String>) -> Error {
        Error::ConversionRejected {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }
}

impl ChartSink for ChartTable {
    fn register(&self, tag: &str, initial: &Value) {
        self.charts
            .entry(tag.to_string())
            .or_insert_with(|| ChartEntry {
                kind: initial.kind(),
                errored: false,
            });
    }

    fn is_errored(&self, tag: &str) -> bool {
        self.charts.get(tag).is_some_and(|entry| entry.errored)
    }

    fn try_convert(&self, tag: &str, value: &Value, numeric: f64) -> Result<f64> {
        let Some(mut entry) = self.charts.get_mut(tag) else {
            return Err(Self::reject(tag, "chart is not registered"));
        };
        if entry.errored {
            return Err(Self::reject(tag, "chart is errored"));
        }
        let kind = value.kind();
        if kind != entry.kind {
            entry.errored = true;
            return Err(Self::reject(
                tag,
                format!("expected {:?} data, got {kind:?}", entry.kind),
            ));
        }
        if entry.kind == ChartKind::Line && !numeric.is_finite() {
            return Err(Self::reject(tag, format!("non-finite value {numeric}")));
        }
        Ok(numeric)
    }
}
