//! Tools around a pretrained NT-proBNP ≥ 300 pg/mL decision-tree classifier.
//!
//! The library backs two command-line utilities:
//! - `ntprobnp-predict` scores a labeled CSV and reports AUROC and F1.
//! - `ntprobnp-export-rules` turns every tree path into an IF/THEN rule for a
//!   clinical decision support system.

/// Application directory resolution.
pub mod app_dirs;
/// Optional TOML settings.
pub mod config;
/// Labeled CSV input and prediction output.
pub mod dataset;
/// Failure categories shared by the pipelines.
pub mod error;
/// Evaluation pipeline.
pub mod eval;
/// Tracing subscriber setup.
pub mod logging;
/// Decision-tree model and metrics.
pub mod ml;
/// Atomic CSV output.
pub mod output;
/// Rule export pipeline.
pub mod rules;
