//! Tests for run configuration

use super::{Algorithm, ConfigError, HyperValue, ModelSpec, RunConfig};

// ---------------------------------------------------------------------------
// Algorithm tests
// ---------------------------------------------------------------------------

#[test]
fn test_algorithm_as_str() {
    assert_eq!(Algorithm::RandomForest.as_str(), "random-forest");
    assert_eq!(Algorithm::GradientBoosting.as_str(), "gradient-boosting");
    assert_eq!(Algorithm::LogisticRegression.as_str(), "logistic-regression");
}

#[test]
fn test_algorithm_display_matches_as_str() {
    assert_eq!(Algorithm::RandomForest.to_string(), "random-forest");
}

#[test]
fn test_algorithm_serde_roundtrip() {
    for algo in [
        Algorithm::RandomForest,
        Algorithm::GradientBoosting,
        Algorithm::LogisticRegression,
    ] {
        let json = serde_json::to_string(&algo).unwrap();
        let back: Algorithm = serde_json::from_str(&json).unwrap();
        assert_eq!(algo, back);
    }
}

// ---------------------------------------------------------------------------
// HyperValue tests
// ---------------------------------------------------------------------------

#[test]
fn test_hyper_value_from_conversions() {
    assert_eq!(HyperValue::from(100i64), HyperValue::Int(100));
    assert_eq!(HyperValue::from(0.1f64), HyperValue::Float(0.1));
    assert_eq!(HyperValue::from(true), HyperValue::Bool(true));
    assert_eq!(HyperValue::from("gini"), HyperValue::Str("gini".into()));
}

#[test]
fn test_hyper_value_display() {
    assert_eq!(HyperValue::Int(200).to_string(), "200");
    assert_eq!(HyperValue::Str("entropy".into()).to_string(), "entropy");
}

#[test]
fn test_hyper_value_untagged_serde() {
    let json = serde_json::to_string(&HyperValue::Int(7)).unwrap();
    assert_eq!(json, "7");
    let back: HyperValue = serde_json::from_str("7").unwrap();
    assert_eq!(back, HyperValue::Int(7));
}

// ---------------------------------------------------------------------------
// ModelSpec tests
// ---------------------------------------------------------------------------

#[test]
fn test_model_spec_builder() {
    let spec = ModelSpec::new(Algorithm::RandomForest)
        .with_hyperparameter("n_estimators", 200i64)
        .with_hyperparameter("max_depth", 8i64);

    assert_eq!(spec.algorithm, Algorithm::RandomForest);
    assert_eq!(spec.hyperparameters.len(), 2);
    assert_eq!(
        spec.hyperparameters.get("n_estimators"),
        Some(&HyperValue::Int(200))
    );
}

// ---------------------------------------------------------------------------
// RunConfig validation tests
// ---------------------------------------------------------------------------

fn base_config() -> RunConfig {
    RunConfig::new(ModelSpec::new(Algorithm::RandomForest)).with_metric("f1_macro")
}

#[test]
fn test_config_valid() {
    assert!(base_config().validate().is_ok());
}

#[test]
fn test_config_default_folds() {
    assert_eq!(base_config().cv_folds, 5);
}

#[test]
fn test_config_fold_count_too_small() {
    let config = base_config().with_cv_folds(1);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::FoldCountTooSmall(1))
    ));
}

#[test]
fn test_config_no_metrics() {
    let config = RunConfig::new(ModelSpec::new(Algorithm::GradientBoosting));
    assert!(matches!(config.validate(), Err(ConfigError::NoMetrics)));
}

#[test]
fn test_config_duplicate_metric() {
    let config = base_config().with_metric("f1_macro");
    assert!(matches!(
        config.validate(),
        Err(ConfigError::DuplicateMetric(m)) if m == "f1_macro"
    ));
}

#[test]
fn test_config_categorical_columns_deduplicated() {
    let config = base_config()
        .with_categorical_column("job")
        .with_categorical_column("job")
        .with_categorical_column("marital");
    assert_eq!(config.categorical_columns.len(), 2);
}

#[test]
fn test_config_serde_roundtrip() {
    let config = base_config()
        .with_categorical_columns(["job", "marital"])
        .with_cv_folds(3)
        .with_metric("roc_auc");

    let json = serde_json::to_string(&config).unwrap();
    let back: RunConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, back);
}
