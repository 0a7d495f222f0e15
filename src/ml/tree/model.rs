use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::FailureKind;

/// Runtime type tag a supported artifact must carry.
pub const MODEL_TYPE: &str = "DecisionTreeClassifier";
/// Feature sentinel marking a leaf node.
pub const TREE_UNDEFINED: i64 = -2;
/// Child sentinel used by leaf nodes.
pub const TREE_LEAF: i64 = -1;
/// Column of the class-count rows that holds the positive class.
pub const POSITIVE_CLASS: usize = 1;
/// Sorted class labels a supported artifact must carry.
pub const BINARY_CLASSES: [i64; 2] = [0, 1];

/// Errors produced while loading or validating a decision-tree artifact.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The artifact file could not be read.
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The artifact is not valid JSON or misses required fields.
    #[error("Invalid model JSON at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The artifact describes some other kind of model.
    #[error("Model at {path} is not a DecisionTreeClassifier (found {found})")]
    UnsupportedModel { path: PathBuf, found: String },
    /// The node arrays violate a structural invariant.
    #[error("Invalid decision tree: {0}")]
    InvalidTree(String),
    /// The artifact could not be written.
    #[error("Failed to write model {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ModelError {
    /// Failure category of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Read { .. } | Self::Write { .. } => FailureKind::Io,
            Self::UnsupportedModel { .. } => FailureKind::TypeMismatch,
            Self::Parse { .. } | Self::InvalidTree(_) => FailureKind::Validation,
        }
    }
}

/// Parallel node arrays of a fitted tree, indexed by node id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeArrays {
    /// Left child id (`-1` for leaves). Taken when `feature <= threshold`.
    pub children_left: Vec<i64>,
    /// Right child id (`-1` for leaves).
    pub children_right: Vec<i64>,
    /// Split feature index (`-2` for leaves).
    pub feature: Vec<i64>,
    /// Split threshold in feature units.
    pub threshold: Vec<f64>,
    /// Shape: `[n_nodes][n_classes]`, per-class sample counts or weighted fractions.
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct ArtifactHeader {
    #[serde(default)]
    model_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawArtifact {
    model_type: String,
    n_features_in: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_names_in: Option<Vec<String>>,
    classes: Vec<i64>,
    tree: TreeArrays,
}

/// Split test of an internal node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    /// Feature index compared against the threshold.
    pub feature: usize,
    /// Values `<= threshold` go left.
    pub threshold: f64,
    /// Left child id.
    pub left: usize,
    /// Right child id.
    pub right: usize,
}

/// Class counts held by a terminal node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf<'a> {
    counts: &'a [f64],
}

impl<'a> Leaf<'a> {
    /// Per-class counts in class order.
    pub fn counts(&self) -> &'a [f64] {
        self.counts
    }

    /// Total sample weight at the leaf.
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Index of the majority class. Equal counts resolve to the lowest index.
    pub fn predicted_class(&self) -> usize {
        let mut best_idx = 0usize;
        let mut best_val = f64::NEG_INFINITY;
        for (idx, &v) in self.counts.iter().enumerate() {
            if v > best_val {
                best_val = v;
                best_idx = idx;
            }
        }
        best_idx
    }

    /// Whether the top class count is shared by more than one class.
    pub fn is_tied(&self) -> bool {
        let best = self.counts[self.predicted_class()];
        self.counts.iter().filter(|&&v| v == best).count() > 1
    }

    /// Positive-class count divided by the leaf total, in `[0, 1]`.
    pub fn positive_probability(&self) -> f64 {
        self.counts[POSITIVE_CLASS] / self.total()
    }

    /// Class fractions in class order.
    pub fn probabilities(&self) -> Vec<f64> {
        let total = self.total();
        self.counts.iter().map(|&v| v / total).collect()
    }
}

/// View of a single node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    /// Internal node with two children.
    Split(Split),
    /// Terminal node.
    Leaf(Leaf<'a>),
}

/// Fitted binary decision-tree classifier.
///
/// Instances only exist in validated form: every child link points forward to
/// an existing node, every split feature is within the input width, and every
/// leaf carries a positive total.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTreeClassifier {
    n_features_in: usize,
    feature_names_in: Option<Vec<String>>,
    classes: Vec<i64>,
    tree: TreeArrays,
}

impl DecisionTreeClassifier {
    /// Build a classifier from its parts, validating the node arrays.
    pub fn new(
        n_features_in: usize,
        feature_names_in: Option<Vec<String>>,
        classes: Vec<i64>,
        tree: TreeArrays,
    ) -> Result<Self, ModelError> {
        let model = Self {
            n_features_in,
            feature_names_in,
            classes,
            tree,
        };
        model.validate()?;
        Ok(model)
    }

    /// Load a model from a JSON artifact, rejecting any other model type.
    pub fn load_json(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_slice(&bytes, path)
    }

    fn from_json_slice(bytes: &[u8], path: &Path) -> Result<Self, ModelError> {
        let parse_err = |source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let header: ArtifactHeader = serde_json::from_slice(bytes).map_err(parse_err)?;
        match header.model_type.as_deref() {
            Some(MODEL_TYPE) => {}
            other => {
                return Err(ModelError::UnsupportedModel {
                    path: path.to_path_buf(),
                    found: other.unwrap_or("an untagged artifact").to_string(),
                });
            }
        }
        let raw: RawArtifact = serde_json::from_slice(bytes).map_err(parse_err)?;
        let model = Self::new(
            raw.n_features_in,
            raw.feature_names_in,
            raw.classes,
            raw.tree,
        )?;
        tracing::debug!(
            path = %path.display(),
            nodes = model.n_nodes(),
            leaves = model.n_leaves(),
            "Loaded decision tree"
        );
        Ok(model)
    }

    /// Serialize the model as a tagged JSON artifact.
    pub fn to_json_string(&self) -> String {
        let raw = RawArtifact {
            model_type: MODEL_TYPE.to_string(),
            n_features_in: self.n_features_in,
            feature_names_in: self.feature_names_in.clone(),
            classes: self.classes.clone(),
            tree: self.tree.clone(),
        };
        // Plain structs of numbers and strings always serialize.
        serde_json::to_string_pretty(&raw).unwrap_or_default()
    }

    /// Write the tagged JSON artifact to `path`.
    pub fn save_json(&self, path: &Path) -> Result<(), ModelError> {
        std::fs::write(path, self.to_json_string()).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate structural invariants of the tree.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |msg: String| Err(ModelError::InvalidTree(msg));
        if self.classes != BINARY_CLASSES {
            return invalid(format!(
                "expected binary classes {BINARY_CLASSES:?}, found {:?}",
                self.classes
            ));
        }
        if self.n_features_in == 0 {
            return invalid("n_features_in must be positive".to_string());
        }
        if let Some(names) = &self.feature_names_in
            && names.len() != self.n_features_in
        {
            return invalid(format!(
                "feature_names_in has {} entries but n_features_in is {}",
                names.len(),
                self.n_features_in
            ));
        }
        let tree = &self.tree;
        let n = tree.feature.len();
        if n == 0 {
            return invalid("tree has no nodes".to_string());
        }
        if tree.threshold.len() != n
            || tree.children_left.len() != n
            || tree.children_right.len() != n
            || tree.value.len() != n
        {
            return invalid("inconsistent node array lengths".to_string());
        }
        for node in 0..n {
            let counts = &tree.value[node];
            if counts.len() != self.classes.len() {
                return invalid(format!(
                    "node {node} has {} class counts, expected {}",
                    counts.len(),
                    self.classes.len()
                ));
            }
            if counts.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return invalid(format!("node {node} has a negative or non-finite count"));
            }
            let feature = tree.feature[node];
            if feature == TREE_UNDEFINED {
                if counts.iter().sum::<f64>() <= 0.0 {
                    return invalid(format!("leaf {node} has no samples"));
                }
                if tree.children_left[node] != TREE_LEAF
                    || tree.children_right[node] != TREE_LEAF
                {
                    return invalid(format!("leaf {node} has child links"));
                }
                continue;
            }
            if feature < 0 || feature as usize >= self.n_features_in {
                return invalid(format!(
                    "node {node} splits on feature {feature} outside 0..{}",
                    self.n_features_in
                ));
            }
            if !tree.threshold[node].is_finite() {
                return invalid(format!("node {node} has a non-finite threshold"));
            }
            for child in [tree.children_left[node], tree.children_right[node]] {
                // Forward-only links rule out cycles and shared ancestors.
                if child <= node as i64 || child >= n as i64 {
                    return invalid(format!("node {node} has invalid child link {child}"));
                }
            }
        }
        Ok(())
    }

    /// Expected number of input features.
    pub const fn n_features(&self) -> usize {
        self.n_features_in
    }

    /// Feature names embedded in the artifact, when it carries them.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names_in.as_deref()
    }

    /// Class labels in column order.
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Number of nodes in the tree.
    pub fn n_nodes(&self) -> usize {
        self.tree.feature.len()
    }

    /// Number of leaf nodes.
    pub fn n_leaves(&self) -> usize {
        self.tree
            .feature
            .iter()
            .filter(|&&f| f == TREE_UNDEFINED)
            .count()
    }

    /// Access a node by id. Panics if `index >= n_nodes()`.
    #[allow(clippy::cast_sign_loss)]
    pub fn node(&self, index: usize) -> Node<'_> {
        let tree = &self.tree;
        let feature = tree.feature[index];
        if feature == TREE_UNDEFINED {
            return Node::Leaf(Leaf {
                counts: &tree.value[index],
            });
        }
        Node::Split(Split {
            feature: feature as usize,
            threshold: tree.threshold[index],
            left: tree.children_left[index] as usize,
            right: tree.children_right[index] as usize,
        })
    }

    /// Tree depth (longest root-to-leaf path).
    pub fn depth(&self) -> usize {
        self.node_depth(0)
    }

    fn node_depth(&self, idx: usize) -> usize {
        match self.node(idx) {
            Node::Leaf(_) => 0,
            Node::Split(split) => {
                1 + self.node_depth(split.left).max(self.node_depth(split.right))
            }
        }
    }

    /// Route a feature row from the root to its leaf.
    ///
    /// Rows shorter than `n_features` read missing features as `0.0`.
    pub fn apply(&self, features: &[f64]) -> Leaf<'_> {
        let mut idx = 0usize;
        loop {
            match self.node(idx) {
                Node::Leaf(leaf) => return leaf,
                Node::Split(split) => {
                    // Trees are fitted on single-precision inputs.
                    let value = features.get(split.feature).copied().unwrap_or(0.0) as f32;
                    idx = if f64::from(value) <= split.threshold {
                        split.left
                    } else {
                        split.right
                    };
                }
            }
        }
    }

    /// Positive-class probability for a feature row.
    pub fn positive_probability(&self, features: &[f64]) -> f64 {
        self.apply(features).positive_probability()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn stump() -> DecisionTreeClassifier {
        // f[0] <= 0.5 → mostly negative, else mostly positive
        DecisionTreeClassifier::new(
            1,
            None,
            vec![0, 1],
            TreeArrays {
                children_left: vec![1, -1, -1],
                children_right: vec![2, -1, -1],
                feature: vec![0, -2, -2],
                threshold: vec![0.5, -2.0, -2.0],
                value: vec![vec![5.0, 5.0], vec![4.0, 1.0], vec![1.0, 4.0]],
            },
        )
        .unwrap()
    }

    fn leaf_only(counts: Vec<f64>) -> TreeArrays {
        TreeArrays {
            children_left: vec![-1],
            children_right: vec![-1],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![counts],
        }
    }

    #[test]
    fn routes_on_threshold_boundary() {
        let model = stump();
        assert_eq!(model.positive_probability(&[0.3]), 0.2);
        assert_eq!(model.positive_probability(&[0.5]), 0.2);
        assert_eq!(model.positive_probability(&[0.7]), 0.8);
        assert_eq!(model.apply(&[0.7]).predicted_class(), 1);
        assert_eq!(model.apply(&[0.3]).probabilities(), vec![0.8, 0.2]);
    }

    #[test]
    fn tree_structure() {
        let model = stump();
        assert_eq!(model.n_nodes(), 3);
        assert_eq!(model.n_leaves(), 2);
        assert_eq!(model.depth(), 1);
        assert_eq!(model.n_features(), 1);
        assert!(model.feature_names().is_none());
    }

    #[test]
    fn tie_resolves_to_lowest_class() {
        let model =
            DecisionTreeClassifier::new(1, None, vec![0, 1], leaf_only(vec![3.0, 3.0])).unwrap();
        let Node::Leaf(leaf) = model.node(0) else {
            panic!("expected leaf");
        };
        assert_eq!(leaf.predicted_class(), 0);
        assert!(leaf.is_tied());
        assert_eq!(leaf.positive_probability(), 0.5);
    }

    #[test]
    fn rejects_backward_child_links() {
        let mut arrays = stump().tree.clone();
        arrays.children_left[0] = 0;
        let err = DecisionTreeClassifier::new(1, None, vec![0, 1], arrays).unwrap_err();
        assert!(matches!(err, ModelError::InvalidTree(_)));
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[test]
    fn rejects_feature_outside_input_width() {
        let mut arrays = stump().tree.clone();
        arrays.feature[0] = 3;
        assert!(DecisionTreeClassifier::new(1, None, vec![0, 1], arrays).is_err());
    }

    #[test]
    fn rejects_empty_leaf_and_multiclass() {
        assert!(DecisionTreeClassifier::new(1, None, vec![0, 1], leaf_only(vec![0.0, 0.0])).is_err());
        let three = TreeArrays {
            value: vec![vec![1.0, 1.0, 1.0]],
            ..leaf_only(vec![])
        };
        assert!(DecisionTreeClassifier::new(1, None, vec![0, 1, 2], three).is_err());
    }

    #[test]
    fn rejects_unsorted_or_foreign_class_labels() {
        for classes in [vec![1, 0], vec![0, 2], vec![-1, 1]] {
            let err = DecisionTreeClassifier::new(1, None, classes, leaf_only(vec![1.0, 2.0]))
                .unwrap_err();
            assert!(err.to_string().contains("binary classes"));
        }
    }

    #[test]
    fn rejects_leaf_with_child_links() {
        let mut arrays = stump().tree.clone();
        arrays.children_left[1] = 2;
        let err = DecisionTreeClassifier::new(1, None, vec![0, 1], arrays).unwrap_err();
        assert!(err.to_string().contains("leaf 1 has child links"));
    }

    #[test]
    fn rejects_embedded_name_count_mismatch() {
        let names = Some(vec!["a".to_string(), "b".to_string()]);
        let err = DecisionTreeClassifier::new(1, names, vec![0, 1], leaf_only(vec![1.0, 2.0]))
            .unwrap_err();
        assert!(err.to_string().contains("feature_names_in"));
    }

    #[test]
    fn json_round_trip_preserves_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = stump();
        model.save_json(&path).unwrap();
        let loaded = DecisionTreeClassifier::load_json(&path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn rejects_other_model_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forest.json");
        let json = stump()
            .to_json_string()
            .replace(MODEL_TYPE, "RandomForestClassifier");
        std::fs::write(&path, json).unwrap();
        let err = DecisionTreeClassifier::load_json(&path).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedModel { ref found, .. } if found == "RandomForestClassifier"));
        assert_eq!(err.kind(), FailureKind::TypeMismatch);
    }

    #[test]
    fn rejects_untagged_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("untagged.json");
        std::fs::write(&path, r#"{"n_features_in": 1}"#).unwrap();
        let err = DecisionTreeClassifier::load_json(&path).unwrap_err();
        assert_eq!(err.kind(), FailureKind::TypeMismatch);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = DecisionTreeClassifier::load_json(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Io);
    }
}
