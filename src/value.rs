//! Sample values accepted by the recorder
//!
//! A sample is either a plain number, text that may parse as a number, or a
//! structured chart payload (histogram, ...) that knows how to reduce itself
//! to a number.

use std::fmt;

use crate::chart::ChartKind;
use crate::{Error, Result};

/// Chart-specific payload carried by a structured sample.
pub trait Payload: fmt::Debug + Send + Sync {
    /// Chart kind this payload renders as.
    fn kind(&self) -> ChartKind;

    /// Numeric reduction stored in the tag series, `None` if there is none.
    fn to_numeric(&self) -> Option<f64>;
}

/// Histogram payload: a bag of raw samples, recorded as their mean.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    samples: Vec<f64>,
}

impl Histogram {
    /// Create a histogram payload from raw samples.
    #[must_use]
    pub fn new(samples: impl Into<Vec<f64>>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    /// Raw samples.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

impl Payload for Histogram {
    fn kind(&self) -> ChartKind {
        ChartKind::Histogram
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_numeric(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}

/// Structured sample: a payload plus the tag and step stamped on it by the
/// recorder.
#[derive(Debug)]
pub struct StructuredValue {
    payload: Box<dyn Payload>,
    tag: Option<String>,
    step: Option<u64>,
}

impl StructuredValue {
    /// Wrap a payload. Tag and step are unset until the recorder stamps them.
    #[must_use]
    pub fn new(payload: impl Payload + 'static) -> Self {
        Self {
            payload: Box::new(payload),
            tag: None,
            step: None,
        }
    }

    /// Set an explicit step carried by the payload itself.
    #[must_use]
    pub const fn with_step(mut self, step: u64) -> Self {
        self.step = Some(step);
        self
    }

    /// Underlying payload.
    #[must_use]
    pub fn payload(&self) -> &dyn Payload {
        self.payload.as_ref()
    }

    /// Tag stamped by the recorder, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Step stamped by the recorder or set explicitly.
    #[must_use]
    pub const fn step(&self) -> Option<u64> {
        self.step
    }

    pub(crate) fn stamp(&mut self, tag: &str, step: u64) {
        self.tag = Some(tag.to_string());
        self.step = Some(step);
    }
}

/// A submitted sample value.
#[derive(Debug)]
pub enum Value {
    /// Plain number.
    Numeric(f64),
    /// Text that is parsed as a float on extraction.
    Text(String),
    /// Chart payload.
    Structured(StructuredValue),
}

impl Value {
    /// Wrap a payload as a structured value.
    #[must_use]
    pub fn structured(payload: impl Payload + 'static) -> Self {
        Self::Structured(StructuredValue::new(payload))
    }

    /// Chart kind implied by the value.
    #[must_use]
    pub fn kind(&self) -> ChartKind {
        match self {
            Self::Numeric(_) | Self::Text(_) => ChartKind::Line,
            Self::Structured(s) => s.payload.kind(),
        }
    }

    /// Structured payload, if any.
    #[must_use]
    pub const fn as_structured(&self) -> Option<&StructuredValue> {
        match self {
            Self::Structured(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_structured_mut(&mut self) -> Option<&mut StructuredValue> {
        match self {
            Self::Structured(s) => Some(s),
            _ => None,
        }
    }

    /// Resolve the value to a comparable number.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnresolvableValue` when text does not parse, a payload
    /// has no numeric reduction, or the result is NaN.
    pub fn extract_numeric(&self, tag: &str) -> Result<f64> {
        let resolved = match self {
            Self::Numeric(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Structured(s) => s.payload.to_numeric(),
        };
        match resolved {
            Some(v) if !v.is_nan() => Ok(v),
            _ => Err(Error::UnresolvableValue {
                tag: tag.to_string(),
                detail: self.describe(),
            }),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Numeric(v) => format!("{v}"),
            Self::Text(s) => format!("{s:?}"),
            Self::Structured(s) => format!("{:?} payload", s.payload.kind()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Numeric(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Numeric(f64::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Numeric(f64::from(v))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: i64) -> Self {
        Self::Numeric(v as f64)
    }
}

impl From<u64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: u64) -> Self {
        Self::Numeric(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<StructuredValue> for Value {
    fn from(v: StructuredValue) -> Self {
        Self::Structured(v)
    }
}

impl From<Histogram> for Value {
    fn from(v: Histogram) -> Self {
        Self::structured(v)
    }
}
