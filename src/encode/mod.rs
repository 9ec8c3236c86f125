//! Ordinal encoding of categorical columns
//!
//! The encoder is fitted once on the full categorical vocabulary of the
//! training data and then maps category strings to ordinal codes. Columns
//! not covered by the encoder pass through unchanged. A category that was
//! never seen at fit time is an error at transform time, not a silent
//! sentinel value.


use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{Column, DataError, Dataset};

/// Errors from encoder fitting and transformation
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("unseen category '{value}' in column '{column}'")]
    UnseenCategory { column: String, value: String },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Result alias for encoding operations
pub type Result<T> = std::result::Result<T, EncodeError>;

/// Ordinal encoder for categorical columns.
///
/// Each covered column gets a vocabulary in first-seen order; codes are the
/// vocabulary positions as floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    /// Column name -> vocabulary in first-seen order
    vocabularies: BTreeMap<String, Vec<String>>,
}

impl OrdinalEncoder {
    /// Fit on the full vocabulary of the given categorical columns.
    pub fn fit<'a, I>(data: &Dataset, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut vocabularies = BTreeMap::new();
        for name in columns {
            let values = data.categorical(name)?;
            let mut seen = BTreeSet::new();
            let mut vocab = Vec::new();
            for value in values {
                if seen.insert(value.as_str()) {
                    vocab.push(value.clone());
                }
            }
            vocabularies.insert(name.clone(), vocab);
        }
        Ok(Self { vocabularies })
    }

    /// Columns covered by the encoder.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.vocabularies.keys().map(String::as_str)
    }

    /// Vocabulary for a column, if covered.
    pub fn vocabulary(&self, column: &str) -> Option<&[String]> {
        self.vocabularies.get(column).map(Vec::as_slice)
    }

    /// Encode a single value.
    pub fn encode_value(&self, column: &str, value: &str) -> Result<f64> {
        let vocab = self
            .vocabularies
            .get(column)
            .ok_or_else(|| DataError::ColumnNotFound(column.to_string()))?;
        vocab
            .iter()
            .position(|v| v == value)
            .map(|i| i as f64)
            .ok_or_else(|| EncodeError::UnseenCategory {
                column: column.to_string(),
                value: value.to_string(),
            })
    }

    /// Transform a dataset: covered categorical columns become numeric
    /// ordinal codes, everything else passes through unchanged.
    pub fn transform(&self, data: &Dataset) -> Result<Dataset> {
        let mut out = Dataset::new();
        for name in data.column_names() {
            let column = data.column(name)?;
            let encoded = match (self.vocabularies.get(name), column) {
                (Some(_), Column::Categorical(values)) => {
                    let codes = values
                        .iter()
                        .map(|v| self.encode_value(name, v))
                        .collect::<Result<Vec<f64>>>()?;
                    Column::Numeric(codes)
                }
                _ => column.clone(),
            };
            out = match encoded {
                Column::Numeric(v) => out.with_numeric(name, v)?,
                Column::Categorical(v) => out.with_categorical(name, v)?,
            };
        }
        Ok(out)
    }
}
