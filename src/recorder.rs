//! Experiment Recorder - the entry point for recording a run's tags
//!
//! ## Sample pipeline
//!
//! ```text
//! add(tag, value, step)
//!   ├─ first sight of tag: create entry, register with chart sink
//!   ├─ chart errored?        -> dropped (warning)
//!   │  ┌──────────── tag entry locked ────────────┐
//!   ├─ │ step = explicit or count + 1              │
//!   ├─ │ step already recorded? -> dropped         │
//!   ├─ │ resolve number        -> dropped if not   │
//!   ├─ │ chart conversion      -> dropped if refused│
//!   ├─ │ TagRecord (encoded tag) -> persistence    │
//!   ├─ │ fold into aggregate                       │
//!   │  └───────────────────────────────────────────┘
//! ```
//!
//! Dropped samples never mutate the tag and are reported as
//! [`AddOutcome::Dropped`] with a warning. Persistence failures come back as
//! `Err` and also leave the tag untouched, so the same step can be retried.
//! Records of one tag reach persistence in acceptance order.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::chart::{ChartSink, ChartTable};
use crate::persist::{MemoryTagStore, TagPersistence, TagRecord};
use crate::run::{
    check_run_name, generate_random_name, make_unique, Run, RunCatalog, RunOptions, RunParts,
    RunSnapshot, Workspace,
};
use crate::tag::{TagAggregate, TagRegistry, TagState};
use crate::value::{StructuredValue, Value};
use crate::{Error, Result};

/// Result of a single [`ExperimentRecorder::add`] call.
#[derive(Debug)]
pub enum AddOutcome {
    /// Sample accepted and persisted.
    Recorded {
        /// Step the sample was recorded at.
        step: u64,
        /// Value after chart conversion.
        value: f64,
    },
    /// Sample dropped; the tag is unchanged.
    Dropped(Error),
}

impl AddOutcome {
    /// Whether the sample was accepted.
    #[must_use]
    pub const fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }

    /// Step of an accepted sample.
    #[must_use]
    pub const fn step(&self) -> Option<u64> {
        match self {
            Self::Recorded { step, .. } => Some(*step),
            Self::Dropped(_) => None,
        }
    }

    /// Why the sample was dropped.
    #[must_use]
    pub const fn dropped_reason(&self) -> Option<&Error> {
        match self {
            Self::Dropped(reason) => Some(reason),
            Self::Recorded { .. } => None,
        }
    }
}

/// Records tag samples for one run and forwards them to persistence.
///
/// `add` takes `&self` and may be called from several threads; each tag's
/// duplicate check, persistence call and aggregate update run under that
/// tag's lock.
/// Terminal transitions take `&mut self`.
pub struct ExperimentRecorder<C = ChartTable, P = MemoryTagStore> {
    run: Run,
    tags: TagRegistry,
    chart: C,
    persistence: P,
}

impl ExperimentRecorder<ChartTable, MemoryTagStore> {
    /// Create a run backed by an in-memory chart table and tag store.
    ///
    /// # Errors
    ///
    /// See [`ExperimentRecorder::create`].
    pub fn in_memory(
        options: RunOptions,
        catalog: &impl RunCatalog,
        workspace: &impl Workspace,
    ) -> Result<Self> {
        Self::create(
            options,
            catalog,
            workspace,
            ChartTable::new(),
            MemoryTagStore::new(),
        )
    }
}

impl<C: ChartSink, P: TagPersistence> ExperimentRecorder<C, P> {
    /// Create and register a new run.
    ///
    /// The name is the explicit one from `options` or a generated tree name,
    /// made unique against the catalog's existing names. The run's logs
    /// directory is created through `workspace`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid name, `Error::Registration` if
    /// the catalog refuses the run, or the workspace's error if the logs
    /// directory cannot be created.
    pub fn create(
        options: RunOptions,
        catalog: &impl RunCatalog,
        workspace: &impl Workspace,
        chart: C,
        persistence: P,
    ) -> Result<Self> {
        let existing = catalog.existing_names()?;
        let candidate = options
            .name()
            .map_or_else(|| generate_random_name(existing.as_slice()), ToString::to_string);
        check_run_name(&candidate)?;

        let taken: HashSet<String> = existing.into_iter().collect();
        let name = make_unique(&candidate, &taken);
        let slot = catalog.register(&name)?;
        workspace.ensure_dir(&slot.logs_dir)?;

        let run = Run::new(RunParts {
            experiment_id: slot.id,
            name,
            description: options.description().to_string(),
            config: options.config().clone(),
            color: options.color().map(ToString::to_string),
            system: options.system_info().clone(),
            argv: options.argv(),
            index: slot.index,
            logs_dir: slot.logs_dir,
        });
        info!(
            run = run.name(),
            id = run.experiment_id(),
            logs = %run.logs_dir().display(),
            "run created"
        );

        Ok(Self {
            run,
            tags: TagRegistry::new(),
            chart,
            persistence,
        })
    }

    /// Record one sample.
    ///
    /// Without an explicit `step` (or one carried by a structured payload)
    /// the sample goes to the step after the tag's accepted samples.
    ///
    /// # Errors
    ///
    /// Only persistence failures are returned as errors. Duplicate steps,
    /// unresolvable values, and chart rejections are reported through
    /// [`AddOutcome::Dropped`].
    pub fn add(&self, tag: &str, value: impl Into<Value>, step: Option<u64>) -> Result<AddOutcome> {
        let mut value = value.into();
        let step = step.or_else(|| value.as_structured().and_then(StructuredValue::step));

        self.tags.ensure_tag_with(tag, || {
            if let Some(structured) = value.as_structured_mut() {
                structured.stamp(tag, step.unwrap_or(1));
            }
            self.chart.register(tag, &value);
        });

        if self.chart.is_errored(tag) {
            return Ok(self.drop_sample(
                tag,
                Error::TagErrored {
                    tag: tag.to_string(),
                },
            ));
        }

        // Outer error: persistence failure. Inner error: drop reason.
        let accepted = self.tags.with_tag(tag, |state| -> Result<Result<(u64, f64)>> {
            let (index, converted) = match self.validate(tag, state, &mut value, step) {
                Ok(accepted) => accepted,
                Err(reason) => return Ok(Err(reason)),
            };
            let record = TagRecord::new(tag, converted, index, state.preview(converted));
            self.persistence.save_tag(record)?;
            state.record_accepted(index, converted);
            Ok(Ok((index, converted)))
        });

        match accepted {
            Some(Ok(Ok((step, value)))) => {
                debug!(run = self.run.name(), tag, step, value, "sample recorded");
                Ok(AddOutcome::Recorded { step, value })
            }
            Some(Ok(Err(reason))) => Ok(self.drop_sample(tag, reason)),
            Some(Err(err)) => {
                warn!(run = self.run.name(), tag, error = %err, "sample not persisted");
                Err(err)
            }
            None => Err(Error::Other(format!("tag '{tag}' vanished from the registry"))),
        }
    }

    /// Step and chart-converted value for a sample, or why it is dropped.
    /// Runs under the tag lock and leaves `state` untouched.
    fn validate(
        &self,
        tag: &str,
        state: &TagState,
        value: &mut Value,
        step: Option<u64>,
    ) -> Result<(u64, f64)> {
        let index = state.next_index(step);
        if state.is_duplicate_step(index) {
            return Err(Error::DuplicateStep {
                tag: tag.to_string(),
                step: index,
            });
        }
        if let Some(structured) = value.as_structured_mut() {
            if structured.tag().is_none() {
                structured.stamp(tag, index);
            }
        }
        let numeric = value.extract_numeric(tag)?;
        let converted = self.chart.try_convert(tag, value, numeric)?;
        Ok((index, converted))
    }

    fn drop_sample(&self, tag: &str, reason: Error) -> AddOutcome {
        warn!(run = self.run.name(), tag, "{reason}");
        AddOutcome::Dropped(reason)
    }

    /// Mark the run successful.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` if the run already finished.
    pub fn success(&mut self) -> Result<()> {
        self.run.success()?;
        info!(run = self.run.name(), tags = self.tags.len(), "run succeeded");
        Ok(())
    }

    /// Mark the run failed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` if the run already finished.
    pub fn fail(&mut self) -> Result<()> {
        self.run.fail()?;
        info!(run = self.run.name(), tags = self.tags.len(), "run failed");
        Ok(())
    }

    /// The run being recorded.
    #[must_use]
    pub const fn run(&self) -> &Run {
        &self.run
    }

    /// Serializable view of the run.
    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        self.run.snapshot()
    }

    /// Aggregate for a tag.
    #[must_use]
    pub fn aggregate(&self, tag: &str) -> Option<TagAggregate> {
        self.tags.aggregate(tag)
    }

    /// Accepted steps of a tag, ascending.
    #[must_use]
    pub fn steps(&self, tag: &str) -> Option<Vec<u64>> {
        self.tags.steps(tag)
    }

    /// Tags seen so far, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.tags.tags()
    }

    /// The persistence layer samples are forwarded to.
    #[must_use]
    pub const fn persistence(&self) -> &P {
        &self.persistence
    }
}
