//! Tag Aggregate - running count/min/max for one tag

use serde::{Deserialize, Serialize};

/// Running summary of a tag's accepted samples.
///
/// `max` and `min` are `None` until the first accepted sample; the first
/// value initializes both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TagAggregate {
    count: u64,
    max: Option<f64>,
    min: Option<f64>,
}

impl TagAggregate {
    /// Create an empty aggregate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: 0,
            max: None,
            min: None,
        }
    }

    /// Number of accepted samples.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Largest accepted value.
    #[must_use]
    pub const fn max(&self) -> Option<f64> {
        self.max
    }

    /// Smallest accepted value.
    #[must_use]
    pub const fn min(&self) -> Option<f64> {
        self.min
    }

    /// Fold an accepted value into the aggregate.
    ///
    /// Callers must not pass NaN; values are resolved before they get here.
    pub fn update(&mut self, value: f64) {
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
        self.count += 1;
    }
}
