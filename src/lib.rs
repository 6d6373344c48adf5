//! # trueno-runlog: Per-Run Metric Recorder
//!
//! **Version**: 0.1.0
//!
//! trueno-runlog records named time-series samples ("tags") for one
//! experiment run. Each sample is deduplicated by step, folded into a
//! running count/min/max, validated by a chart sink, and forwarded to a
//! persistence layer as a normalized record.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke**: A step is accepted at most once per tag; unresolvable
//!   values never reach the aggregate
//! - **Jidoka**: Bad samples stop at the recorder with a warning instead of
//!   aborting the run
//! - **Heijunka**: Per-tag locking lets many producers record concurrently
//!
//! ## Example Usage
//!
//! ```rust
//! use trueno_runlog::run::{MemoryCatalog, MemoryWorkspace, RunOptions};
//! use trueno_runlog::ExperimentRecorder;
//!
//! let catalog = MemoryCatalog::new("runs");
//! let mut recorder = ExperimentRecorder::in_memory(
//!     RunOptions::new().with_name("baseline"),
//!     &catalog,
//!     &MemoryWorkspace::new(),
//! )?;
//!
//! for epoch in 1..=3_u32 {
//!     recorder.add("loss", 1.0 / f64::from(epoch), None)?;
//! }
//! // Step 3 is already recorded: dropped with a warning
//! assert!(!recorder.add("loss", 0.1, Some(3))?.is_recorded());
//!
//! let loss = recorder.aggregate("loss").unwrap();
//! assert_eq!(loss.count(), 3);
//! assert_eq!(loss.max(), Some(1.0));
//!
//! recorder.success()?;
//! # Ok::<(), trueno_runlog::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod chart;
pub mod error;
pub mod logging;
pub mod persist;
pub mod recorder;
pub mod run;
pub mod tag;
pub mod value;

pub use error::{Error, Result};
pub use recorder::{AddOutcome, ExperimentRecorder};
pub use value::Value;
