//! Binary decision-tree classifier loaded from a JSON artifact.
//!
//! The artifact mirrors the parallel node arrays of a fitted tree
//! (`children_left`, `children_right`, `feature`, `threshold`, `value`) plus
//! the input width, the class labels and, optionally, the feature names the
//! tree was fitted with. Only inference and inspection live here; training
//! happens elsewhere.

mod features;
mod format;
mod model;

pub use features::{FeatureNameError, resolve_feature_names};
pub use format::{format_percent, format_significant};
pub use model::{
    BINARY_CLASSES, DecisionTreeClassifier, Leaf, MODEL_TYPE, ModelError, Node, POSITIVE_CLASS,
    Split, TREE_LEAF, TREE_UNDEFINED, TreeArrays,
};
