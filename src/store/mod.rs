//! Append-only experiment store
//!
//! An [`Experiment`] is a named, ordered collection of completed
//! [`Run`](crate::executor::Run) records. Runs are appended, never edited,
//! never removed, never reordered: the history is the audit trail that
//! answers "why was run X chosen" long after the fact. Persistence goes
//! through the pluggable [`ExperimentBackend`](storage::ExperimentBackend)
//! trait.

pub mod storage;


use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::executor::Run;
use storage::{ExperimentBackend, StorageError};

pub use storage::{InMemoryBackend, JsonFileBackend};

/// Errors from experiment store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("experiment not found: {0}")]
    ExperimentNotFound(String),

    #[error("run not found: {run_id} in experiment {experiment_id}")]
    RunNotFound {
        experiment_id: String,
        run_id: String,
    },

    #[error("duplicate run id {run_id} in experiment {experiment_id}")]
    DuplicateRunId {
        experiment_id: String,
        run_id: String,
    },

    #[error("run {run_id} belongs to experiment {run_experiment_id}, not {experiment_id}")]
    ExperimentMismatch {
        experiment_id: String,
        run_experiment_id: String,
        run_id: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// A named, append-only collection of runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    /// Stable identifier
    pub experiment_id: String,
    /// Globally unique name
    pub name: String,
    /// Completed runs in append order
    pub runs: Vec<Run>,
}

/// Experiment store over a pluggable backend.
#[derive(Debug)]
pub struct ExperimentStore<B: ExperimentBackend> {
    backend: B,
}

impl<B: ExperimentBackend> ExperimentStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get the experiment with the given name, creating it with an empty
    /// run sequence if it does not exist. Idempotent by name.
    pub fn get_or_create(&mut self, name: &str) -> Result<Experiment> {
        if let Some(existing) = self.backend.find_by_name(name)? {
            return Ok(existing);
        }
        let experiment = Experiment {
            experiment_id: format!("exp-{}", self.backend.count()? + 1),
            name: name.to_string(),
            runs: Vec::new(),
        };
        self.backend.save(&experiment)?;
        info!(experiment_id = %experiment.experiment_id, name, "experiment created");
        Ok(experiment)
    }

    /// Append a completed run. The only mutation the store supports.
    pub fn append(&mut self, experiment_id: &str, run: Run) -> Result<()> {
        if run.experiment_id != experiment_id {
            return Err(StoreError::ExperimentMismatch {
                experiment_id: experiment_id.to_string(),
                run_experiment_id: run.experiment_id.clone(),
                run_id: run.run_id.clone(),
            });
        }
        let mut experiment = self
            .backend
            .load(experiment_id)?
            .ok_or_else(|| StoreError::ExperimentNotFound(experiment_id.to_string()))?;

        if experiment.runs.iter().any(|r| r.run_id == run.run_id) {
            return Err(StoreError::DuplicateRunId {
                experiment_id: experiment_id.to_string(),
                run_id: run.run_id,
            });
        }

        let run_id = run.run_id.clone();
        experiment.runs.push(run);
        self.backend.save(&experiment)?;
        info!(experiment_id, run_id = %run_id, "run appended");
        Ok(())
    }

    /// All runs of an experiment in append order.
    pub fn list_runs(&self, experiment_id: &str) -> Result<Vec<Run>> {
        let experiment = self
            .backend
            .load(experiment_id)?
            .ok_or_else(|| StoreError::ExperimentNotFound(experiment_id.to_string()))?;
        Ok(experiment.runs)
    }

    /// Retrieve a single run by identifier.
    pub fn get_run(&self, experiment_id: &str, run_id: &str) -> Result<Run> {
        let runs = self.list_runs(experiment_id)?;
        runs.into_iter()
            .find(|r| r.run_id == run_id)
            .ok_or_else(|| StoreError::RunNotFound {
                experiment_id: experiment_id.to_string(),
                run_id: run_id.to_string(),
            })
    }
}
