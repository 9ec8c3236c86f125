//! Run execution
//!
//! The executor takes an immutable [`RunConfig`](crate::config::RunConfig),
//! cross-validates and fits the configured pipeline through the
//! [`Trainer`] seam, persists the fitted artifact, and assembles the
//! completed [`Run`] record. Run completion is all-or-nothing: on any
//! failure no `Run` value exists, so a partial run can never reach the
//! experiment store.


use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::artifact::{ArtifactRef, ArtifactStore};
use crate::config::{ConfigError, RunConfig};
use crate::data::Dataset;
use crate::encode::OrdinalEncoder;
use crate::metrics::MetricRecorder;
use crate::trainer::{stratified_folds, PreprocessingSpec, Trainer, TrainingError};

/// Errors from run execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Training(#[from] TrainingError),
}

/// Result alias for run execution
pub type Result<T> = std::result::Result<T, ExecuteError>;

/// A run parameter value: flattened config entries plus derived facts such
/// as the class-label order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

/// One completed train-and-score trial.
///
/// Immutable once created; the experiment store only ever appends runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Unique within an experiment; derived from creation time + sequence
    pub run_id: String,
    /// Owning experiment
    pub experiment_id: String,
    /// Flattened configuration plus derived facts
    pub params: BTreeMap<String, ParamValue>,
    /// `mean_<score>` / `std_<score>` pairs for every tracked metric
    pub metrics: BTreeMap<String, f64>,
    /// Handle to the persisted fitted pipeline
    pub artifact_ref: ArtifactRef,
    /// Run completion time
    pub created_at: DateTime<Utc>,
}

impl Run {
    /// Class labels recorded at fit time, in the classifier's order.
    pub fn class_labels(&self) -> Option<&[String]> {
        match self.params.get("class_labels") {
            Some(ParamValue::List(labels)) => Some(labels),
            _ => None,
        }
    }
}

/// Process-wide run sequence; run ids stay unique across executor
/// instances within one process.
static RUN_SEQ: AtomicU64 = AtomicU64::new(1);

/// Executes runs against a trainer and an artifact store.
///
/// Runs execute start-to-finish, one at a time; there is no overlap
/// between invocations.
#[derive(Debug)]
pub struct RunExecutor<'a, T: Trainer, A: ArtifactStore> {
    trainer: &'a T,
    artifacts: &'a mut A,
}

impl<'a, T: Trainer, A: ArtifactStore> RunExecutor<'a, T, A> {
    pub fn new(trainer: &'a T, artifacts: &'a mut A) -> Self {
        Self { trainer, artifacts }
    }

    /// Execute one run: validate, cross-validate, fit on all data, persist
    /// the artifact, and assemble the run record.
    ///
    /// Cross-validation scores estimate generalization; the final fit uses
    /// all available rows so the artifact that gets promoted has seen every
    /// sample. The two are deliberately decoupled.
    pub fn execute(
        &mut self,
        experiment_id: &str,
        config: &RunConfig,
        data: &Dataset,
        target_column: &str,
    ) -> Result<Run> {
        config.validate()?;

        let target = data
            .categorical(target_column)
            .map_err(TrainingError::from)?
            .to_vec();
        let features = data
            .without_column(target_column)
            .map_err(TrainingError::from)?;

        let folds = stratified_folds(&target, config.cv_folds)?;

        // Encoder sees the full vocabulary, not just any one fold's
        let encoder = OrdinalEncoder::fit(&features, &config.categorical_columns)
            .map_err(TrainingError::from)?;
        let preprocessing = PreprocessingSpec { encoder };

        let fold_scores = self.trainer.cross_validate(
            &preprocessing,
            &config.model,
            &features,
            &target,
            &folds,
            &config.metrics_to_track,
        )?;
        let mut recorder = MetricRecorder::new();
        recorder.record_all(&fold_scores);

        let fitted =
            self.trainer
                .fit_pipeline(&preprocessing, &config.model, &features, &target)?;

        let created_at = Utc::now();
        let run_id = next_run_id(created_at);
        let artifact_path = format!("{}-{}", config.model.algorithm, run_id);
        let artifact_ref = self
            .artifacts
            .write(&artifact_path, &fitted)
            .map_err(TrainingError::from)?;

        let params = flatten_params(config, target_column, &fitted.class_labels);
        let run = Run {
            run_id,
            experiment_id: experiment_id.to_string(),
            params,
            metrics: recorder.into_metrics(),
            artifact_ref,
            created_at,
        };

        info!(
            run_id = %run.run_id,
            experiment_id = %run.experiment_id,
            algorithm = %config.model.algorithm,
            "run completed"
        );
        Ok(run)
    }
}

fn next_run_id(created_at: DateTime<Utc>) -> String {
    let seq = RUN_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq:04}", created_at.format("%Y%m%dT%H%M%S"))
}

/// Flatten the config and derived facts into the run's params mapping.
fn flatten_params(
    config: &RunConfig,
    target_column: &str,
    class_labels: &[String],
) -> BTreeMap<String, ParamValue> {
    let mut params = BTreeMap::new();
    params.insert(
        "algorithm".to_string(),
        ParamValue::Str(config.model.algorithm.to_string()),
    );
    for (key, value) in &config.model.hyperparameters {
        params.insert(format!("model.{key}"), ParamValue::Str(value.to_string()));
    }
    params.insert(
        "categorical_columns".to_string(),
        ParamValue::List(config.categorical_columns.iter().cloned().collect()),
    );
    params.insert(
        "cv_folds".to_string(),
        ParamValue::Int(config.cv_folds as i64),
    );
    params.insert(
        "metrics_to_track".to_string(),
        ParamValue::List(config.metrics_to_track.clone()),
    );
    params.insert(
        "target_column".to_string(),
        ParamValue::Str(target_column.to_string()),
    );
    // Label order must match what the fitted classifier uses internally;
    // consumers map output indices back to names through this
    params.insert(
        "class_labels".to_string(),
        ParamValue::List(class_labels.to_vec()),
    );
    params
}
