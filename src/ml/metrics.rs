//! Evaluation metrics for binary classification models.

use thiserror::Error;

/// Errors raised when a metric is undefined for the given inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricError {
    #[error("Cannot score an empty dataset")]
    EmptyInput,
    #[error("Label count {labels} does not match score count {scores}")]
    LengthMismatch { labels: usize, scores: usize },
    #[error("Only one class present in the labels; ROC AUC is not defined")]
    SingleClass,
}

#[derive(Debug, Clone)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Tally paired truth/prediction class indices into a matrix.
    pub fn from_predictions(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Self {
        let mut cm = Self::new(n_classes);
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p);
        }
        cm
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }
}

#[derive(Debug, Clone)]
/// Precision/recall statistics for a single class.
pub struct PerClassStats {
    /// `TP / (TP + FP)`, `0` when nothing was predicted for the class.
    pub precision: f64,
    /// `TP / (TP + FN)`, `0` when the class has no true examples.
    pub recall: f64,
    /// Total number of true examples for the class.
    pub support: u32,
}

impl PerClassStats {
    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> f64 {
        f1_score(self.precision, self.recall)
    }
}

/// Compute per-class precision and recall from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = f64::from(cm.get(class_idx, class_idx));
        let mut fp = 0f64;
        let mut fn_ = 0f64;
        let mut support = 0u32;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += f64::from(v);
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += f64::from(cm.get(i, class_idx));
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        stats.push(PerClassStats {
            precision,
            recall,
            support,
        });
    }
    stats
}

/// Harmonic mean of precision and recall, `0` when both are zero.
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// F1 score of the positive class (`1`) for binary labels.
pub fn binary_f1(truth: &[u8], predicted: &[u8]) -> Result<f64, MetricError> {
    check_lengths(truth.len(), predicted.len())?;
    let as_idx = |values: &[u8]| values.iter().map(|&v| usize::from(v)).collect::<Vec<_>>();
    let cm = ConfusionMatrix::from_predictions(2, &as_idx(truth), &as_idx(predicted));
    Ok(precision_recall_by_class(&cm)[1].f1())
}

/// Area under the ROC curve for binary labels and positive-class scores.
///
/// Uses the rank-sum formulation with average ranks for tied scores, which
/// equals the trapezoidal area under the empirical ROC curve.
pub fn roc_auc(truth: &[u8], scores: &[f64]) -> Result<f64, MetricError> {
    check_lengths(truth.len(), scores.len())?;
    let n_pos = truth.iter().filter(|&&t| t == 1).count();
    let n_neg = truth.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(MetricError::SingleClass);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    let mut positive_rank_sum = 0f64;
    let mut start = 0usize;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; a tie group shares the mean of its ranks.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let positives = order[start..end]
            .iter()
            .filter(|&&idx| truth[idx] == 1)
            .count();
        positive_rank_sum += avg_rank * positives as f64;
        start = end;
    }
    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((positive_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

fn check_lengths(labels: usize, scores: usize) -> Result<(), MetricError> {
    if labels != scores {
        return Err(MetricError::LengthMismatch { labels, scores });
    }
    if labels == 0 {
        return Err(MetricError::EmptyInput);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn confusion_matrix_counts_pairs() {
        let cm = ConfusionMatrix::from_predictions(2, &[0, 0, 1, 1], &[0, 1, 1, 1]);
        assert_eq!(cm.get(0, 0), 1);
        assert_eq!(cm.get(0, 1), 1);
        assert_eq!(cm.get(1, 1), 2);
        assert_eq!(cm.get(1, 0), 0);
    }

    #[test]
    fn per_class_precision_recall() {
        let cm = ConfusionMatrix::from_predictions(2, &[0, 0, 1, 1], &[0, 1, 1, 1]);
        let stats = precision_recall_by_class(&cm);
        assert!(close(stats[1].precision, 2.0 / 3.0));
        assert!(close(stats[1].recall, 1.0));
        assert_eq!(stats[1].support, 2);
        assert!(close(stats[0].precision, 1.0));
        assert!(close(stats[0].recall, 0.5));
    }

    #[test]
    fn binary_f1_matches_hand_computation() {
        // tp=2 fp=1 fn=1 → precision=recall=2/3
        let f1 = binary_f1(&[1, 1, 1, 0, 0], &[1, 1, 0, 1, 0]).unwrap();
        assert!(close(f1, 2.0 / 3.0));
    }

    #[test]
    fn binary_f1_without_positive_predictions_is_zero() {
        assert_eq!(binary_f1(&[1, 0], &[0, 0]).unwrap(), 0.0);
    }

    #[test]
    fn auc_perfect_and_inverted() {
        assert!(close(roc_auc(&[0, 0, 1, 1], &[0.1, 0.2, 0.8, 0.9]).unwrap(), 1.0));
        assert!(close(roc_auc(&[1, 1, 0, 0], &[0.1, 0.2, 0.8, 0.9]).unwrap(), 0.0));
    }

    #[test]
    fn auc_averages_tied_scores() {
        // Classic example: y=[0,0,1,1], s=[0.1,0.4,0.35,0.8] → 0.75
        assert!(close(
            roc_auc(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]).unwrap(),
            0.75
        ));
        // All scores equal → 0.5
        assert!(close(roc_auc(&[0, 1, 0, 1], &[0.3; 4]).unwrap(), 0.5));
    }

    #[test]
    fn auc_requires_both_classes() {
        assert_eq!(roc_auc(&[1, 1], &[0.2, 0.4]), Err(MetricError::SingleClass));
        assert_eq!(roc_auc(&[], &[]), Err(MetricError::EmptyInput));
        assert_eq!(
            roc_auc(&[0, 1], &[0.2]),
            Err(MetricError::LengthMismatch {
                labels: 2,
                scores: 1
            })
        );
    }
}
