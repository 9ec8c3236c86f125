//! Metric recording for a single run
//!
//! Cross-validation produces a vector of scores per metric; the recorder
//! folds each vector into a mean and a standard deviation, stored under
//! `mean_<name>` and `std_<name>`. The recorder accumulates scalars for
//! exactly one run and is consumed when the run record is assembled.


use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-fold cross-validation scores, keyed by score name.
///
/// Trainers emit test-set scores under `test_<metric>` keys, so the
/// recorded names come out as `mean_test_<metric>` / `std_test_<metric>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoldScores {
    scores: BTreeMap<String, Vec<f64>>,
}

impl FoldScores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-fold score vector for a named score.
    pub fn insert(&mut self, name: &str, folds: Vec<f64>) {
        self.scores.insert(name.to_string(), folds);
    }

    /// Iterate score names and their per-fold vectors, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.scores.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Whether no scores were recorded.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Accumulates named scalar metrics for one run.
#[derive(Debug, Clone, Default)]
pub struct MetricRecorder {
    values: BTreeMap<String, f64>,
}

impl MetricRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single scalar metric.
    pub fn record(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// Record mean and population standard deviation of per-fold scores as
    /// `mean_<name>` and `std_<name>`.
    pub fn record_fold_scores(&mut self, name: &str, folds: &[f64]) {
        let (mean, std) = mean_std(folds);
        self.values.insert(format!("mean_{name}"), mean);
        self.values.insert(format!("std_{name}"), std);
    }

    /// Record every score vector in a [`FoldScores`].
    pub fn record_all(&mut self, scores: &FoldScores) {
        for (name, folds) in scores.iter() {
            self.record_fold_scores(name, folds);
        }
    }

    /// Look up a recorded value.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Number of recorded scalars.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the recorder, yielding the final metric mapping.
    pub fn into_metrics(self) -> BTreeMap<String, f64> {
        self.values
    }
}

/// Mean and population standard deviation. Empty input yields (0, 0).
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
