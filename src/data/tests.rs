//! Tests for tabular datasets

use super::{Column, DataError, Dataset, DatasetProvider, InMemoryProvider};

fn sample() -> Dataset {
    Dataset::new()
        .with_categorical("job", vec!["admin", "tech", "admin"])
        .unwrap()
        .with_numeric("age", vec![34.0, 41.0, 29.0])
        .unwrap()
}

#[test]
fn test_dataset_n_rows() {
    assert_eq!(sample().n_rows(), 3);
    assert_eq!(Dataset::new().n_rows(), 0);
}

#[test]
fn test_dataset_column_order_preserved() {
    assert_eq!(sample().column_names(), &["job", "age"]);
}

#[test]
fn test_dataset_column_lookup() {
    let data = sample();
    assert!(matches!(data.column("age"), Ok(Column::Numeric(_))));
    assert!(matches!(
        data.column("missing"),
        Err(DataError::ColumnNotFound(_))
    ));
}

#[test]
fn test_dataset_categorical_lookup() {
    let data = sample();
    assert_eq!(data.categorical("job").unwrap(), &["admin", "tech", "admin"]);
    assert!(matches!(
        data.categorical("age"),
        Err(DataError::NotCategorical(_))
    ));
}

#[test]
fn test_dataset_length_mismatch_rejected() {
    let result = sample().with_numeric("balance", vec![1.0, 2.0]);
    assert!(matches!(
        result,
        Err(DataError::LengthMismatch { got: 2, expected: 3, .. })
    ));
}

#[test]
fn test_dataset_duplicate_column_rejected() {
    let result = sample().with_numeric("age", vec![1.0, 2.0, 3.0]);
    assert!(matches!(result, Err(DataError::DuplicateColumn(_))));
}

#[test]
fn test_dataset_without_column() {
    let features = sample().without_column("job").unwrap();
    assert_eq!(features.column_names(), &["age"]);
    assert_eq!(features.n_rows(), 3);
    assert!(matches!(
        sample().without_column("missing"),
        Err(DataError::ColumnNotFound(_))
    ));
}

#[test]
fn test_dataset_serde_roundtrip() {
    let data = sample();
    let json = serde_json::to_string(&data).unwrap();
    let back: Dataset = serde_json::from_str(&json).unwrap();
    assert_eq!(data, back);
}

#[test]
fn test_provider_load() {
    let mut provider = InMemoryProvider::new();
    provider.insert("bank", sample());

    let loaded = provider.load("bank").unwrap();
    assert_eq!(loaded.n_rows(), 3);

    assert!(matches!(
        provider.load("nope"),
        Err(DataError::UnknownDataset(_))
    ));
}
