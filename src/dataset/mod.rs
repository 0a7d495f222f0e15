//! Labeled CSV input and per-row prediction output for the evaluator.

pub mod loader;
mod predictions;

pub use loader::{DatasetError, LabeledTable, load_labeled_csv};
pub use predictions::{format_probability, write_predictions_csv};
