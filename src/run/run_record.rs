//! Run Record - one tracked execution and its lifecycle

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Status of a run.
///
/// Serialized as the integer sentinels `0` (running), `1` (success) and
/// `-1` (failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum RunStatus {
    /// Run is currently executing.
    Running,
    /// Run completed successfully.
    Success,
    /// Run failed.
    Failed,
}

impl RunStatus {
    /// Whether the status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl From<RunStatus> for i8 {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Running => 0,
            RunStatus::Success => 1,
            RunStatus::Failed => -1,
        }
    }
}

impl TryFrom<i8> for RunStatus {
    type Error = String;

    fn try_from(code: i8) -> std::result::Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Running),
            1 => Ok(Self::Success),
            -1 => Ok(Self::Failed),
            other => Err(format!("unknown run status code {other}")),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Serializable view of a run, written out by external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Run ID assigned by the catalog.
    pub experiment_id: u64,
    /// Unique run name.
    pub name: String,
    /// Recorder crate version.
    pub version: String,
    /// Run status sentinel.
    pub status: RunStatus,
    /// Free-form description.
    pub description: String,
    /// User configuration (hyperparameters).
    pub config: serde_json::Value,
    /// Display color, if assigned.
    pub color: Option<String>,
    /// System information collected by the caller.
    pub system: serde_json::Value,
    /// Process arguments.
    pub argv: Vec<String>,
    /// Position of the run in its catalog.
    pub index: u64,
    /// Creation timestamp.
    pub create_time: DateTime<Utc>,
    /// Last update timestamp.
    pub update_time: DateTime<Utc>,
}

/// A single tracked run.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    experiment_id: u64,
    name: String,
    description: String,
    config: serde_json::Value,
    color: Option<String>,
    system: serde_json::Value,
    argv: Vec<String>,
    index: u64,
    logs_dir: PathBuf,
    status: RunStatus,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

/// Fields of a run fixed at creation.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunParts {
    pub experiment_id: u64,
    pub name: String,
    pub description: String,
    pub config: serde_json::Value,
    pub color: Option<String>,
    pub system: serde_json::Value,
    pub argv: Vec<String>,
    pub index: u64,
    pub logs_dir: PathBuf,
}

impl Run {
    pub(crate) fn new(parts: RunParts) -> Self {
        let now = Utc::now();
        Self {
            experiment_id: parts.experiment_id,
            name: parts.name,
            description: parts.description,
            config: parts.config,
            color: parts.color,
            system: parts.system,
            argv: parts.argv,
            index: parts.index,
            logs_dir: parts.logs_dir,
            status: RunStatus::Running,
            create_time: now,
            update_time: now,
        }
    }

    /// Get the run ID.
    #[must_use]
    pub const fn experiment_id(&self) -> u64 {
        self.experiment_id
    }

    /// Get the run name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the user configuration.
    #[must_use]
    pub const fn config(&self) -> &serde_json::Value {
        &self.config
    }

    /// Get the catalog index.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.index
    }

    /// Get the logs directory.
    #[must_use]
    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    /// Get the last update timestamp.
    #[must_use]
    pub const fn update_time(&self) -> DateTime<Utc> {
        self.update_time
    }

    /// Mark the run successful.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` if the run already finished.
    pub fn success(&mut self) -> Result<()> {
        self.finish(RunStatus::Success)
    }

    /// Mark the run failed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` if the run already finished.
    pub fn fail(&mut self) -> Result<()> {
        self.finish(RunStatus::Failed)
    }

    fn finish(&mut self, status: RunStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::InvalidTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        // Clock ties happen on coarse timers; the update must still land after.
        let now = Utc::now();
        self.update_time = if now > self.update_time {
            now
        } else {
            self.update_time + Duration::microseconds(1)
        };
        self.status = status;
        Ok(())
    }

    /// Serializable view of the run.
    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            experiment_id: self.experiment_id,
            name: self.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: self.status,
            description: self.description.clone(),
            config: self.config.clone(),
            color: self.color.clone(),
            system: self.system.clone(),
            argv: self.argv.clone(),
            index: self.index,
            create_time: self.create_time,
            update_time: self.update_time,
        }
    }
}
