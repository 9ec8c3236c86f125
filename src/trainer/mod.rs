//! Trainer capability seam
//!
//! The core never trains models itself; it hands a preprocessing spec and a
//! model spec to a [`Trainer`] and gets back per-fold scores and a fitted,
//! serializable [`FittedPipeline`]. Any real algorithm plugs in behind this
//! trait. Stratified fold construction lives here too, since fold validity
//! (every class present in every fold) is part of the training contract.


use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::config::{Algorithm, ModelSpec};
use crate::data::{DataError, Dataset};
use crate::encode::{EncodeError, OrdinalEncoder};
use crate::metrics::FoldScores;

/// Errors raised while fitting or scoring a pipeline
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(
        "class '{class}' has {count} samples but stratified {folds}-fold CV \
         requires at least {folds} per class"
    )]
    InsufficientClassSamples {
        class: String,
        count: usize,
        folds: usize,
    },

    #[error("cross-validation failed: {0}")]
    CrossValidation(String),

    #[error("pipeline fit failed: {0}")]
    Fit(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Result alias for training operations
pub type Result<T> = std::result::Result<T, TrainingError>;

/// Two-stage preprocessing: ordinal-encode the covered categorical columns,
/// pass every other column through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingSpec {
    /// Encoder fitted on the full categorical vocabulary of the run's data
    pub encoder: OrdinalEncoder,
}

/// A fitted pipeline: the serializable artifact a run produces and a
/// promotion imports.
///
/// `class_labels` records the label ordering the classifier assigned
/// internally; consumers of the pipeline's outputs need it to map output
/// indices back to label names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    /// Algorithm that produced the pipeline
    pub algorithm: Algorithm,
    /// Preprocessing baked into the pipeline
    pub preprocessing: PreprocessingSpec,
    /// Class labels in the classifier's internal order
    pub class_labels: Vec<String>,
    /// Opaque fitted-model payload
    pub payload: serde_json::Value,
}

/// One train/test split by row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Deterministic stratified k-fold assignment.
///
/// Indices of each class are dealt round-robin across folds in row order,
/// so every fold's test set holds roughly `1/k` of each class. Fails when
/// any class has fewer than `k` samples; a fold whose test set misses a
/// class would silently skew stratified scoring.
pub fn stratified_folds(labels: &[String], k: usize) -> Result<Vec<FoldSplit>> {
    if k < 2 {
        return Err(TrainingError::CrossValidation(format!(
            "fold count must be at least 2, got {k}"
        )));
    }
    let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        by_class.entry(label.as_str()).or_default().push(idx);
    }

    for (class, indices) in &by_class {
        if indices.len() < k {
            return Err(TrainingError::InsufficientClassSamples {
                class: (*class).to_string(),
                count: indices.len(),
                folds: k,
            });
        }
    }

    let mut test_sets: Vec<Vec<usize>> = vec![Vec::new(); k];
    for indices in by_class.values() {
        for (pos, idx) in indices.iter().enumerate() {
            test_sets[pos % k].push(*idx);
        }
    }

    let folds = (0..k)
        .map(|fold| {
            let test = {
                let mut t = test_sets[fold].clone();
                t.sort_unstable();
                t
            };
            let train = (0..labels.len()).filter(|i| !test.contains(i)).collect();
            FoldSplit { train, test }
        })
        .collect();
    Ok(folds)
}

/// Training capability the core depends on.
///
/// `data` is the feature table (target column already removed); `target`
/// holds the per-row class labels.
pub trait Trainer {
    /// Fit the full pipeline on all rows.
    fn fit_pipeline(
        &self,
        preprocessing: &PreprocessingSpec,
        model: &ModelSpec,
        data: &Dataset,
        target: &[String],
    ) -> Result<FittedPipeline>;

    /// Score each requested metric on every fold's test set.
    ///
    /// Returned score names follow the `test_<metric>` convention.
    fn cross_validate(
        &self,
        preprocessing: &PreprocessingSpec,
        model: &ModelSpec,
        data: &Dataset,
        target: &[String],
        folds: &[FoldSplit],
        metric_names: &[String],
    ) -> Result<FoldScores>;

    /// Score a fitted pipeline against a held-out dataset.
    fn score(
        &self,
        pipeline: &FittedPipeline,
        data: &Dataset,
        target: &[String],
        metric_names: &[String],
    ) -> Result<BTreeMap<String, f64>>;
}

/// Deterministic trainer for testing
///
/// Runs the real encoder over the data (so encoding failures surface the
/// way they would in production), derives class labels in lexical order,
/// and returns configured fold scores. Score values default to 0.5 for any
/// metric not configured.
#[derive(Debug, Default)]
pub struct StubTrainer {
    fold_scores: HashMap<String, Vec<f64>>,
    holdout_scores: HashMap<String, f64>,
    fail_fit: Option<String>,
}

impl StubTrainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the per-fold scores returned for a score name
    /// (e.g. `test_f1_macro`).
    #[must_use]
    pub fn with_fold_scores(mut self, name: &str, folds: Vec<f64>) -> Self {
        self.fold_scores.insert(name.to_string(), folds);
        self
    }

    /// Configure a held-out score returned by [`Trainer::score`].
    #[must_use]
    pub fn with_holdout_score(mut self, metric: &str, value: f64) -> Self {
        self.holdout_scores.insert(metric.to_string(), value);
        self
    }

    /// Make `fit_pipeline` fail with the given message.
    #[must_use]
    pub fn with_fit_failure(mut self, message: &str) -> Self {
        self.fail_fit = Some(message.to_string());
        self
    }

    fn sorted_labels(target: &[String]) -> Vec<String> {
        let mut labels: Vec<String> = target.to_vec();
        labels.sort();
        labels.dedup();
        labels
    }
}

impl Trainer for StubTrainer {
    fn fit_pipeline(
        &self,
        preprocessing: &PreprocessingSpec,
        model: &ModelSpec,
        data: &Dataset,
        target: &[String],
    ) -> Result<FittedPipeline> {
        if let Some(message) = &self.fail_fit {
            return Err(TrainingError::Fit(message.clone()));
        }
        let encoded = preprocessing.encoder.transform(data)?;
        let class_labels = Self::sorted_labels(target);
        Ok(FittedPipeline {
            algorithm: model.algorithm,
            preprocessing: preprocessing.clone(),
            class_labels,
            payload: serde_json::json!({
                "n_rows": encoded.n_rows(),
                "n_features": encoded.column_names().len(),
            }),
        })
    }

    fn cross_validate(
        &self,
        preprocessing: &PreprocessingSpec,
        _model: &ModelSpec,
        data: &Dataset,
        _target: &[String],
        folds: &[FoldSplit],
        metric_names: &[String],
    ) -> Result<FoldScores> {
        preprocessing.encoder.transform(data)?;
        let mut scores = FoldScores::new();
        for metric in metric_names {
            let key = format!("test_{metric}");
            let values = self
                .fold_scores
                .get(&key)
                .cloned()
                .unwrap_or_else(|| vec![0.5; folds.len()]);
            if values.len() != folds.len() {
                return Err(TrainingError::CrossValidation(format!(
                    "configured {} scores for '{key}' but {} folds requested",
                    values.len(),
                    folds.len()
                )));
            }
            scores.insert(&key, values);
        }
        Ok(scores)
    }

    fn score(
        &self,
        pipeline: &FittedPipeline,
        data: &Dataset,
        _target: &[String],
        metric_names: &[String],
    ) -> Result<BTreeMap<String, f64>> {
        pipeline.preprocessing.encoder.transform(data)?;
        Ok(metric_names
            .iter()
            .map(|m| {
                let value = self.holdout_scores.get(m).copied().unwrap_or(0.5);
                (m.clone(), value)
            })
            .collect())
    }
}
