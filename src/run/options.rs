//! Run Options - caller-supplied configuration for a new run

use serde::Deserialize;

use crate::{Error, Result};

/// Options for creating a run.
///
/// Built in code with the `with_*` setters or loaded from a JSON document
/// with [`RunOptions::from_json`]. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    name: Option<String>,
    description: String,
    config: serde_json::Value,
    color: Option<String>,
    system_info: serde_json::Value,
    argv: Option<Vec<String>>,
}

impl RunOptions {
    /// Default options: random name, empty description and config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on malformed JSON or unknown keys.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Set an explicit run name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the user configuration.
    #[must_use]
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    /// Set the display color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set collected system information.
    #[must_use]
    pub fn with_system_info(mut self, system_info: serde_json::Value) -> Self {
        self.system_info = system_info;
        self
    }

    /// Override the recorded process arguments.
    #[must_use]
    pub fn with_argv(mut self, argv: Vec<String>) -> Self {
        self.argv = Some(argv);
        self
    }

    /// Explicit run name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// User configuration.
    #[must_use]
    pub const fn config(&self) -> &serde_json::Value {
        &self.config
    }

    /// Display color, if any.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// System information.
    #[must_use]
    pub const fn system_info(&self) -> &serde_json::Value {
        &self.system_info
    }

    /// Process arguments, falling back to the current process.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        self.argv
            .clone()
            .unwrap_or_else(|| std::env::args().collect())
    }
}
