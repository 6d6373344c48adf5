//! Error types for trueno-runlog
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-runlog error types
#[derive(Error, Debug)]
pub enum Error {
    /// Submitted value cannot be coerced to a number
    #[error("Unresolvable value for tag '{tag}': {detail}")]
    UnresolvableValue {
        /// Tag the sample was submitted under
        tag: String,
        /// What could not be converted
        detail: String,
    },

    /// Step index already recorded for the tag
    #[error("The step '{step}' of tag '{tag}' already exists and is no longer updated")]
    DuplicateStep {
        /// Tag name
        tag: String,
        /// Duplicate step index
        step: u64,
    },

    /// Chart sink has marked the tag as unrecoverable
    #[error("Chart '{tag}' has been marked as error, ignored")]
    TagErrored {
        /// Tag name
        tag: String,
    },

    /// Chart sink refused to convert the value
    #[error("Chart '{tag}' rejected value: {reason}")]
    ConversionRejected {
        /// Tag name
        tag: String,
        /// Rejection reason reported by the sink
        reason: String,
    },

    /// Terminal run state cannot be left or re-entered
    #[error("Invalid run transition: {from} -> {to}\nA run is finished exactly once")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Persistence layer failed to accept a record
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Run registration failed
    #[error("Run registration failed: {0}")]
    Registration(String),

    /// Invalid run options or run name
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error is absorbed by the recorder (warning only) rather
    /// than propagated to the caller.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnresolvableValue { .. }
                | Self::DuplicateStep { .. }
                | Self::TagErrored { .. }
                | Self::ConversionRejected { .. }
        )
    }
}
