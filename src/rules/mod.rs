//! Export of decision-tree paths as IF/THEN rules for a decision support system.
//!
//! Every leaf becomes one CSV row:
//!
//! ```text
//! rule,comment,leaf_probability
//! age ≤ 65 AND egfr ≤ 60.3,Predict NT-proBNP ≥ 300 pg mL⁻¹,80.00%
//! ```

mod walker;
mod writer;

pub use walker::{
    ALWAYS_TRUE, CONJUNCTION, RuleComments, RuleRow, THRESHOLD_DIGITS, extract_rules,
};
pub use writer::{RULE_HEADER, write_rules_csv};

use std::path::PathBuf;

use thiserror::Error;

use crate::error::FailureKind;
use crate::ml::tree::{DecisionTreeClassifier, FeatureNameError, ModelError, resolve_feature_names};
use crate::output::OutputError;

/// Errors produced by the rule export pipeline.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    FeatureNames(#[from] FeatureNameError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

impl ExportError {
    /// Failure category of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Model(err) => err.kind(),
            Self::FeatureNames(err) => err.kind(),
            Self::Output(_) => FailureKind::Io,
        }
    }
}

/// Inputs of a single export run.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// JSON model artifact.
    pub model_path: PathBuf,
    /// Destination CSV, replaced if it exists.
    pub out_path: PathBuf,
    /// Optional newline-delimited feature-name list.
    pub feature_file: Option<PathBuf>,
    /// THEN sentences for each class.
    pub comments: RuleComments,
}

/// Outcome of a successful export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of rule rows written.
    pub rules_written: usize,
    /// Where the rules were written.
    pub out_path: PathBuf,
}

/// Load the model, resolve feature names, walk the tree and write the rules.
///
/// Nothing is written unless every earlier stage succeeds.
pub fn export_rules(request: &ExportRequest) -> Result<ExportSummary, ExportError> {
    let tree = DecisionTreeClassifier::load_json(&request.model_path)?;
    let feature_names = resolve_feature_names(&tree, request.feature_file.as_deref())?;
    tracing::info!(
        nodes = tree.n_nodes(),
        leaves = tree.n_leaves(),
        depth = tree.depth(),
        "Walking decision tree"
    );
    let rows = extract_rules(&tree, &feature_names, &request.comments);
    let rules_written = write_rules_csv(&request.out_path, &rows)?;
    tracing::info!(
        rules = rules_written,
        path = %request.out_path.display(),
        "Exported decision rules"
    );
    Ok(ExportSummary {
        rules_written,
        out_path: request.out_path.clone(),
    })
}
