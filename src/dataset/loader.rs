//! Loader for labeled feature CSVs.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::FailureKind;
use crate::ml::tree::DecisionTreeClassifier;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read CSV {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Input CSV {path} must contain a '{column}' label column")]
    MissingLabelColumn { path: PathBuf, column: String },
    #[error("Input CSV {path} has no data rows")]
    Empty { path: PathBuf },
    #[error("Row {row}: label '{value}' is not 0 or 1")]
    InvalidLabel { row: usize, value: String },
    #[error("Row {row}: column '{column}' holds non-numeric value '{value}'")]
    InvalidFeature {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Model feature '{column}' is not a column of the input CSV")]
    MissingFeatureColumn { column: String },
    #[error("Input CSV has {found} feature columns but the model expects {expected}")]
    FeatureCountMismatch { expected: usize, found: usize },
}

impl DatasetError {
    /// Failure category of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Csv { source, .. } if source.is_io_error() => FailureKind::Io,
            _ => FailureKind::Validation,
        }
    }
}

/// Feature table with its ground-truth labels split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledTable {
    /// Header of the non-label columns, in file order.
    pub feature_columns: Vec<String>,
    /// Original cell text of the non-label columns, one entry per data row.
    pub rows: Vec<Vec<String>>,
    /// Binary ground-truth label per data row.
    pub labels: Vec<u8>,
}

impl LabeledTable {
    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse the columns the model consumes into numeric rows.
    ///
    /// Columns are picked by name when the model carries feature names, and
    /// positionally otherwise.
    pub fn feature_matrix(
        &self,
        model: &DecisionTreeClassifier,
    ) -> Result<Vec<Vec<f64>>, DatasetError> {
        let indices = self.model_column_indices(model)?;
        let mut matrix = Vec::with_capacity(self.rows.len());
        for (row_idx, row) in self.rows.iter().enumerate() {
            let mut values = Vec::with_capacity(indices.len());
            for &col in &indices {
                values.push(parse_feature(&row[col]).ok_or_else(|| {
                    DatasetError::InvalidFeature {
                        row: row_idx + 1,
                        column: self.feature_columns[col].clone(),
                        value: row[col].clone(),
                    }
                })?);
            }
            matrix.push(values);
        }
        Ok(matrix)
    }

    fn model_column_indices(
        &self,
        model: &DecisionTreeClassifier,
    ) -> Result<Vec<usize>, DatasetError> {
        match model.feature_names() {
            Some(names) => names
                .iter()
                .map(|name| {
                    self.feature_columns
                        .iter()
                        .position(|col| col == name)
                        .ok_or_else(|| DatasetError::MissingFeatureColumn {
                            column: name.clone(),
                        })
                })
                .collect(),
            None => {
                if self.feature_columns.len() != model.n_features() {
                    return Err(DatasetError::FeatureCountMismatch {
                        expected: model.n_features(),
                        found: self.feature_columns.len(),
                    });
                }
                Ok((0..model.n_features()).collect())
            }
        }
    }
}

/// Read `path` and split `label_column` off the feature columns.
pub fn load_labeled_csv(path: &Path, label_column: &str) -> Result<LabeledTable, DatasetError> {
    let csv_err = |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    let label_idx = headers
        .iter()
        .position(|h| h == label_column)
        .ok_or_else(|| DatasetError::MissingLabelColumn {
            path: path.to_path_buf(),
            column: label_column.to_string(),
        })?;
    let feature_columns = without_column(&headers, label_idx);

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let raw_label = &record[label_idx];
        let label = parse_label(raw_label).ok_or_else(|| DatasetError::InvalidLabel {
            row: row_idx + 1,
            value: raw_label.to_string(),
        })?;
        labels.push(label);
        rows.push(without_column(&record, label_idx));
    }
    if rows.is_empty() {
        return Err(DatasetError::Empty {
            path: path.to_path_buf(),
        });
    }
    tracing::debug!(
        path = %path.display(),
        rows = rows.len(),
        columns = feature_columns.len(),
        "Loaded labeled CSV"
    );
    Ok(LabeledTable {
        feature_columns,
        rows,
        labels,
    })
}

fn without_column(record: &csv::StringRecord, skip: usize) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != skip)
        .map(|(_, field)| field.to_string())
        .collect()
}

fn parse_label(raw: &str) -> Option<u8> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        return match value {
            v if v == 0.0 => Some(0),
            v if v == 1.0 => Some(1),
            _ => None,
        };
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => Some(1),
        "false" => Some(0),
        _ => None,
    }
}

fn parse_feature(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}
