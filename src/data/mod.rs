//! Tabular datasets and the dataset provider seam
//!
//! A [`Dataset`] is a small column-oriented table with named columns and a
//! uniform row count. Datasets arrive through the [`DatasetProvider`] trait
//! so the same pipeline runs against fixtures in tests and a real source in
//! production.

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from dataset construction and lookup
#[derive(Debug, Error)]
pub enum DataError {
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("column '{name}' has {got} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        got: usize,
        expected: usize,
    },

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("column '{0}' is not categorical")]
    NotCategorical(String),
}

/// Result alias for dataset operations
pub type Result<T> = std::result::Result<T, DataError>;

/// A single named column of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// String-valued categorical column
    Categorical(Vec<String>),
    /// Float-valued numeric column
    Numeric(Vec<f64>),
}

impl Column {
    /// Number of rows in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::Categorical(v) => v.len(),
            Column::Numeric(v) => v.len(),
        }
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Column-oriented table with named columns and a uniform row count.
///
/// Column insertion order is preserved; all columns must have the same
/// number of rows, enforced at insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    order: Vec<String>,
    columns: HashMap<String, Column>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a categorical column.
    pub fn with_categorical<S: Into<String>>(
        self,
        name: &str,
        values: Vec<S>,
    ) -> Result<Self> {
        let values = values.into_iter().map(Into::into).collect();
        self.insert(name, Column::Categorical(values))
    }

    /// Add a numeric column.
    pub fn with_numeric(self, name: &str, values: Vec<f64>) -> Result<Self> {
        self.insert(name, Column::Numeric(values))
    }

    fn insert(mut self, name: &str, column: Column) -> Result<Self> {
        if self.columns.contains_key(name) {
            return Err(DataError::DuplicateColumn(name.to_string()));
        }
        if let Some(expected) = self.order.first().map(|n| self.columns[n].len()) {
            if column.len() != expected {
                return Err(DataError::LengthMismatch {
                    name: name.to_string(),
                    got: column.len(),
                    expected,
                });
            }
        }
        self.order.push(name.to_string());
        self.columns.insert(name.to_string(), column);
        Ok(self)
    }

    /// Number of rows (0 for an empty dataset).
    pub fn n_rows(&self) -> usize {
        self.order.first().map_or(0, |n| self.columns[n].len())
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.order
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// Look up a categorical column's values.
    pub fn categorical(&self, name: &str) -> Result<&[String]> {
        match self.column(name)? {
            Column::Categorical(v) => Ok(v),
            Column::Numeric(_) => Err(DataError::NotCategorical(name.to_string())),
        }
    }

    /// Copy of the dataset without the given column. Used to split the
    /// target column out of the feature table.
    pub fn without_column(&self, name: &str) -> Result<Dataset> {
        self.column(name)?;
        let order: Vec<String> = self.order.iter().filter(|n| *n != name).cloned().collect();
        let columns = order
            .iter()
            .map(|n| (n.clone(), self.columns[n].clone()))
            .collect();
        Ok(Dataset { order, columns })
    }
}

/// Source of named datasets, both for training input and for post-promotion
/// evaluation data.
pub trait DatasetProvider {
    /// Load a dataset by name.
    fn load(&self, name: &str) -> Result<Dataset>;
}

/// In-memory dataset provider for testing
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    datasets: HashMap<String, Dataset>,
}

impl InMemoryProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset under a name, replacing any previous entry.
    pub fn insert(&mut self, name: &str, dataset: Dataset) {
        self.datasets.insert(name.to_string(), dataset);
    }
}

impl DatasetProvider for InMemoryProvider {
    fn load(&self, name: &str) -> Result<Dataset> {
        self.datasets
            .get(name)
            .cloned()
            .ok_or_else(|| DataError::UnknownDataset(name.to_string()))
    }
}
