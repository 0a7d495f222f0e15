//! Failure categories shared by both command-line pipelines.

use std::fmt;

/// Coarse category of a fatal pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The model artifact is not a decision-tree classifier.
    TypeMismatch,
    /// Input content is malformed or inconsistent with the model.
    Validation,
    /// A required setting or metadata source is missing or invalid.
    Configuration,
    /// A file could not be read or written.
    Io,
}

impl FailureKind {
    /// Stable lowercase label used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TypeMismatch => "type_mismatch",
            Self::Validation => "validation",
            Self::Configuration => "configuration",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
