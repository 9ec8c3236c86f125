//! Experiment storage backends
//!
//! Provides the `ExperimentBackend` trait, an in-memory implementation, and
//! a JSON file-based implementation that stores one file per experiment.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Experiment;

/// Errors from experiment storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for experiment storage backends
pub trait ExperimentBackend {
    /// Persist an experiment, replacing any previous state under its id.
    fn save(&mut self, experiment: &Experiment) -> Result<()>;

    /// Load an experiment by id.
    fn load(&self, experiment_id: &str) -> Result<Option<Experiment>>;

    /// Find an experiment by its unique name.
    fn find_by_name(&self, name: &str) -> Result<Option<Experiment>>;

    /// Number of stored experiments.
    fn count(&self) -> Result<usize>;
}

/// In-memory experiment backend for testing
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    experiments: HashMap<String, Experiment>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExperimentBackend for InMemoryBackend {
    fn save(&mut self, experiment: &Experiment) -> Result<()> {
        self.experiments
            .insert(experiment.experiment_id.clone(), experiment.clone());
        Ok(())
    }

    fn load(&self, experiment_id: &str) -> Result<Option<Experiment>> {
        Ok(self.experiments.get(experiment_id).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Experiment>> {
        Ok(self.experiments.values().find(|e| e.name == name).cloned())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.experiments.len())
    }
}

/// JSON file-based experiment backend
///
/// Stores each experiment as `{experiment_id}.json` in a directory. Saves
/// write to a temporary file and rename into place, so a concurrent reader
/// never observes a torn experiment file.
#[derive(Debug)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend over the given directory, creating it lazily on
    /// first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn experiment_path(&self, experiment_id: &str) -> PathBuf {
        self.dir.join(format!("{experiment_id}.json"))
    }

    fn read_all(&self) -> Result<Vec<Experiment>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut experiments = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let json = fs::read_to_string(&path)?;
                experiments.push(serde_json::from_str(&json)?);
            }
        }
        Ok(experiments)
    }
}

impl ExperimentBackend for JsonFileBackend {
    fn save(&mut self, experiment: &Experiment) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let json = serde_json::to_string_pretty(experiment)?;
        let path = self.experiment_path(&experiment.experiment_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load(&self, experiment_id: &str) -> Result<Option<Experiment>> {
        let path = self.experiment_path(experiment_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Experiment>> {
        Ok(self.read_all()?.into_iter().find(|e| e.name == name))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }
}
