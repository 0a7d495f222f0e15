use std::path::{Path, PathBuf};

use thiserror::Error;

use super::DecisionTreeClassifier;
use crate::error::FailureKind;

/// Errors produced while resolving the feature-name list for a model.
#[derive(Debug, Error)]
pub enum FeatureNameError {
    /// The feature-name file could not be read.
    #[error("Failed to read feature names {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file lists a different number of names than the model expects.
    #[error("Feature file {path} lists {found} names but the model expects {expected}")]
    LengthMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
    /// Neither a file nor embedded names are available.
    #[error("Model carries no feature names; supply a feature list with --features FILE")]
    Missing,
}

impl FeatureNameError {
    /// Failure category of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Read { .. } => FailureKind::Io,
            Self::LengthMismatch { .. } => FailureKind::Validation,
            Self::Missing => FailureKind::Configuration,
        }
    }
}

/// Return feature names in the exact order used by the model.
///
/// An explicit file (one name per line) takes precedence over names embedded
/// in the artifact.
pub fn resolve_feature_names(
    model: &DecisionTreeClassifier,
    feature_file: Option<&Path>,
) -> Result<Vec<String>, FeatureNameError> {
    if let Some(path) = feature_file {
        let text = std::fs::read_to_string(path).map_err(|source| FeatureNameError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let names = parse_feature_list(&text);
        if names.len() != model.n_features() {
            return Err(FeatureNameError::LengthMismatch {
                path: path.to_path_buf(),
                expected: model.n_features(),
                found: names.len(),
            });
        }
        tracing::debug!(path = %path.display(), count = names.len(), "Using feature file");
        return Ok(names);
    }
    match model.feature_names() {
        Some(names) => Ok(names.to_vec()),
        None => Err(FeatureNameError::Missing),
    }
}

/// Single-character line terminators recognised in a feature file.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Split on every line break, treating `\r\n` as one. A trailing break does
/// not start an extra empty name.
fn parse_feature_list(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n");
    let mut names: Vec<String> = text.split(LINE_BREAKS).map(str::to_string).collect();
    if names.last().is_some_and(String::is_empty) {
        names.pop();
    }
    names
}
