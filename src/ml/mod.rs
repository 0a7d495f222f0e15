//! Machine learning helpers for inference and evaluation.
//!
//! These utilities load a pretrained decision tree, score feature rows with it
//! and compute the summary metrics reported by the evaluator.

pub mod metrics;
pub mod tree;
