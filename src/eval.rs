//! Scoring of a labeled dataset against the pretrained tree.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{ConfigError, check_threshold};
use crate::dataset::{DatasetError, LabeledTable, load_labeled_csv, write_predictions_csv};
use crate::error::FailureKind;
use crate::ml::metrics::{MetricError, binary_f1, roc_auc};
use crate::ml::tree::{DecisionTreeClassifier, ModelError};
use crate::output::OutputError;

/// Errors produced by the evaluation pipeline.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("Metric undefined: {0}")]
    Metric(#[from] MetricError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

impl EvalError {
    /// Failure category of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Model(err) => err.kind(),
            Self::Dataset(err) => err.kind(),
            Self::Metric(_) => FailureKind::Validation,
            Self::Config(err) => err.kind(),
            Self::Output(_) => FailureKind::Io,
        }
    }
}

/// Inputs of a single evaluation run.
#[derive(Debug, Clone)]
pub struct EvalRequest {
    /// Labeled feature CSV.
    pub data_path: PathBuf,
    /// JSON model artifact.
    pub model_path: PathBuf,
    /// Name of the ground-truth column.
    pub label_column: String,
    /// Probabilities at or above this value count as positive.
    pub threshold: f64,
}

/// Per-row scores and the summary metrics computed from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Positive-class probability per row.
    pub probabilities: Vec<f64>,
    /// Thresholded prediction per row.
    pub predictions: Vec<u8>,
    /// Area under the ROC curve.
    pub auroc: f64,
    /// F1 score of the positive class.
    pub f1: f64,
}

impl Evaluation {
    /// Metric lines as printed by the evaluator.
    pub fn report_lines(&self) -> [String; 2] {
        [
            format!("AUROC : {:.2}", self.auroc),
            format!("F1    : {:.2}", self.f1),
        ]
    }
}

/// Loaded table together with its evaluation.
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    pub table: LabeledTable,
    pub evaluation: Evaluation,
}

impl EvalOutcome {
    /// Write the feature columns plus `probability_column` to `path`.
    pub fn write_predictions(&self, path: &Path, probability_column: &str) -> Result<(), EvalError> {
        write_predictions_csv(
            path,
            &self.table,
            &self.evaluation.probabilities,
            probability_column,
        )?;
        tracing::info!(path = %path.display(), rows = self.table.len(), "Saved predictions");
        Ok(())
    }
}

/// Score every row of `table` and compute AUROC and F1.
pub fn score_table(
    model: &DecisionTreeClassifier,
    table: &LabeledTable,
    threshold: f64,
) -> Result<Evaluation, EvalError> {
    let threshold = check_threshold(threshold)?;
    let features = table.feature_matrix(model)?;
    let probabilities: Vec<f64> = features
        .iter()
        .map(|row| model.positive_probability(row))
        .collect();
    let predictions: Vec<u8> = probabilities
        .iter()
        .map(|&p| u8::from(p >= threshold))
        .collect();
    let auroc = roc_auc(&table.labels, &probabilities)?;
    let f1 = binary_f1(&table.labels, &predictions)?;
    tracing::debug!(rows = table.len(), threshold, auroc, f1, "Scored dataset");
    Ok(Evaluation {
        probabilities,
        predictions,
        auroc,
        f1,
    })
}

/// Load the model and the labeled CSV, then score the dataset.
pub fn evaluate(request: &EvalRequest) -> Result<EvalOutcome, EvalError> {
    let model = DecisionTreeClassifier::load_json(&request.model_path)?;
    let table = load_labeled_csv(&request.data_path, &request.label_column)?;
    tracing::info!(
        rows = table.len(),
        positives = table.labels.iter().filter(|&&l| l == 1).count(),
        "Evaluating decision tree"
    );
    let evaluation = score_table(&model, &table, request.threshold)?;
    Ok(EvalOutcome { table, evaluation })
}
