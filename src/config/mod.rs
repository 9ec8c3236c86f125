//! Run configuration
//!
//! A [`RunConfig`] captures everything that varies between trials: which
//! columns get categorical encoding, the model specification, the
//! cross-validation fold count, and the metrics to track. It is validated
//! once, before any training work starts, and is immutable for the lifetime
//! of the run.

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classifier algorithm selection.
///
/// A closed, tagged set rather than a free-form name: each variant carries
/// its own display name, so run labels never depend on runtime type
/// inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Random forest ensemble
    RandomForest,
    /// Gradient boosted trees
    GradientBoosting,
    /// Regularized logistic regression
    LogisticRegression,
}

impl Algorithm {
    /// Stable name used in run params and artifact paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::RandomForest => "random-forest",
            Algorithm::GradientBoosting => "gradient-boosting",
            Algorithm::LogisticRegression => "logistic-regression",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scalar hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HyperValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for HyperValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HyperValue::Bool(b) => write!(f, "{b}"),
            HyperValue::Int(i) => write!(f, "{i}"),
            HyperValue::Float(v) => write!(f, "{v}"),
            HyperValue::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for HyperValue {
    fn from(v: i64) -> Self {
        HyperValue::Int(v)
    }
}

impl From<f64> for HyperValue {
    fn from(v: f64) -> Self {
        HyperValue::Float(v)
    }
}

impl From<bool> for HyperValue {
    fn from(v: bool) -> Self {
        HyperValue::Bool(v)
    }
}

impl From<&str> for HyperValue {
    fn from(v: &str) -> Self {
        HyperValue::Str(v.to_string())
    }
}

/// Model specification: algorithm plus its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Which classifier to fit
    pub algorithm: Algorithm,
    /// Hyperparameters, key -> scalar value
    pub hyperparameters: BTreeMap<String, HyperValue>,
}

impl ModelSpec {
    /// Create a spec with default hyperparameters.
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            hyperparameters: BTreeMap::new(),
        }
    }

    /// Add a hyperparameter.
    pub fn with_hyperparameter(mut self, key: &str, value: impl Into<HyperValue>) -> Self {
        self.hyperparameters.insert(key.to_string(), value.into());
        self
    }
}

/// Configuration errors detected before any training work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cross-validation fold count must be at least 2, got {0}")]
    FoldCountTooSmall(usize),

    #[error("metrics_to_track must not be empty")]
    NoMetrics,

    #[error("duplicate tracked metric: {0}")]
    DuplicateMetric(String),
}

/// Result alias for configuration validation
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Immutable configuration for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Columns to ordinal-encode; all other columns pass through unchanged
    pub categorical_columns: BTreeSet<String>,
    /// Model specification
    pub model: ModelSpec,
    /// Stratified cross-validation fold count (>= 2)
    pub cv_folds: usize,
    /// Metric names to score during cross-validation, in tracking order
    pub metrics_to_track: Vec<String>,
}

impl RunConfig {
    /// Create a config with no categorical columns, 5-fold CV, and no
    /// tracked metrics. At least one metric must be added before the config
    /// validates.
    pub fn new(model: ModelSpec) -> Self {
        Self {
            categorical_columns: BTreeSet::new(),
            model,
            cv_folds: 5,
            metrics_to_track: Vec::new(),
        }
    }

    /// Mark a column for ordinal encoding.
    pub fn with_categorical_column(mut self, name: &str) -> Self {
        self.categorical_columns.insert(name.to_string());
        self
    }

    /// Mark several columns for ordinal encoding.
    pub fn with_categorical_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_columns.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the cross-validation fold count.
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Track a metric during cross-validation.
    pub fn with_metric(mut self, name: &str) -> Self {
        self.metrics_to_track.push(name.to_string());
        self
    }

    /// Validate the configuration.
    ///
    /// Called by the executor before any training work; a malformed config
    /// never reaches the trainer.
    pub fn validate(&self) -> Result<()> {
        if self.cv_folds < 2 {
            return Err(ConfigError::FoldCountTooSmall(self.cv_folds));
        }
        if self.metrics_to_track.is_empty() {
            return Err(ConfigError::NoMetrics);
        }
        let mut seen = BTreeSet::new();
        for metric in &self.metrics_to_track {
            if !seen.insert(metric.as_str()) {
                return Err(ConfigError::DuplicateMetric(metric.clone()));
            }
        }
        Ok(())
    }
}
