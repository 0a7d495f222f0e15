use crate::ml::tree::{DecisionTreeClassifier, Node, format_percent, format_significant};

/// Joins path conditions of a single rule.
pub const CONJUNCTION: &str = " AND ";
/// Condition text of a rule whose path is empty.
pub const ALWAYS_TRUE: &str = "TRUE";
/// Significant digits used for split thresholds.
pub const THRESHOLD_DIGITS: usize = 3;

/// Sentences used for the THEN part of each rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleComments {
    /// Sentence for leaves predicting the positive class.
    pub positive: String,
    /// Sentence for leaves predicting the negative class.
    pub negative: String,
}

impl Default for RuleComments {
    fn default() -> Self {
        Self {
            positive: "Predict NT-proBNP ≥ 300 pg mL⁻¹".to_string(),
            negative: "Predict NT-proBNP < 300 pg mL⁻¹".to_string(),
        }
    }
}

/// One exported rule: the path to a leaf and what the leaf predicts.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRow {
    /// `AND`-joined split conditions from the root, or `TRUE`.
    pub condition: String,
    /// Sentence describing the predicted class.
    pub comment: String,
    /// Positive-class fraction at the leaf, in `[0, 1]`.
    pub leaf_probability: f64,
    /// Majority class at the leaf.
    pub predicted_class: usize,
}

impl RuleRow {
    /// Leaf probability rendered as a percentage (`"80.00%"`).
    pub fn probability_text(&self) -> String {
        format_percent(self.leaf_probability)
    }
}

/// Enumerate every leaf of `tree` as a rule, depth-first and left before right.
///
/// Panics if `feature_names` holds fewer entries than the model's input width.
pub fn extract_rules(
    tree: &DecisionTreeClassifier,
    feature_names: &[String],
    comments: &RuleComments,
) -> Vec<RuleRow> {
    let mut rows = Vec::with_capacity(tree.n_leaves());
    let mut path = Vec::new();
    traverse(0, tree, feature_names, comments, &mut path, &mut rows);
    rows
}

fn traverse(
    node_id: usize,
    tree: &DecisionTreeClassifier,
    feature_names: &[String],
    comments: &RuleComments,
    path: &mut Vec<String>,
    out_rows: &mut Vec<RuleRow>,
) {
    match tree.node(node_id) {
        Node::Split(split) => {
            let name = &feature_names[split.feature];
            let threshold = format_significant(split.threshold, THRESHOLD_DIGITS);

            path.push(format!("{name} ≤ {threshold}"));
            traverse(split.left, tree, feature_names, comments, path, out_rows);
            path.pop();

            path.push(format!("{name} > {threshold}"));
            traverse(split.right, tree, feature_names, comments, path, out_rows);
            path.pop();
        }
        Node::Leaf(leaf) => {
            let condition = if path.is_empty() {
                ALWAYS_TRUE.to_string()
            } else {
                path.join(CONJUNCTION)
            };
            if leaf.is_tied() {
                tracing::warn!(node_id, "Leaf has tied class counts; predicting class 0");
            }
            let predicted_class = leaf.predicted_class();
            let comment = if predicted_class == 1 {
                comments.positive.clone()
            } else {
                comments.negative.clone()
            };
            out_rows.push(RuleRow {
                condition,
                comment,
                leaf_probability: leaf.positive_probability(),
                predicted_class,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::tree::TreeArrays;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn deeper_tree() -> DecisionTreeClassifier {
        // age <= 65:
        //   egfr <= 60.3 → 2:8
        //   else → 9:1
        // else → 1:3
        DecisionTreeClassifier::new(
            2,
            None,
            vec![0, 1],
            TreeArrays {
                children_left: vec![1, 2, -1, -1, -1],
                children_right: vec![4, 3, -1, -1, -1],
                feature: vec![0, 1, -2, -2, -2],
                threshold: vec![65.0, 60.3, -2.0, -2.0, -2.0],
                value: vec![
                    vec![12.0, 12.0],
                    vec![11.0, 9.0],
                    vec![2.0, 8.0],
                    vec![9.0, 1.0],
                    vec![1.0, 3.0],
                ],
            },
        )
        .unwrap()
    }

    #[test]
    fn single_leaf_yields_true_rule() {
        let tree = DecisionTreeClassifier::new(
            1,
            None,
            vec![0, 1],
            TreeArrays {
                children_left: vec![-1],
                children_right: vec![-1],
                feature: vec![-2],
                threshold: vec![-2.0],
                value: vec![vec![1.0, 3.0]],
            },
        )
        .unwrap();
        let rows = extract_rules(&tree, &names(&["x"]), &RuleComments::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].condition, "TRUE");
        assert_eq!(rows[0].comment, "Predict NT-proBNP ≥ 300 pg mL⁻¹");
        assert_eq!(rows[0].probability_text(), "75.00%");
    }

    #[test]
    fn rules_follow_depth_first_left_to_right() {
        let rows = extract_rules(
            &deeper_tree(),
            &names(&["age", "egfr"]),
            &RuleComments::default(),
        );
        let conditions: Vec<&str> = rows.iter().map(|r| r.condition.as_str()).collect();
        assert_eq!(
            conditions,
            vec![
                "age ≤ 65 AND egfr ≤ 60.3",
                "age ≤ 65 AND egfr > 60.3",
                "age > 65",
            ]
        );
        let probs: Vec<String> = rows.iter().map(RuleRow::probability_text).collect();
        assert_eq!(probs, vec!["80.00%", "10.00%", "75.00%"]);
        assert_eq!(rows[1].comment, "Predict NT-proBNP < 300 pg mL⁻¹");
    }

    #[test]
    fn one_rule_per_leaf_using_only_split_operators() {
        let tree = deeper_tree();
        let rows = extract_rules(&tree, &names(&["age", "egfr"]), &RuleComments::default());
        assert_eq!(rows.len(), tree.n_leaves());
        for row in &rows {
            assert!((0.0..=1.0).contains(&row.leaf_probability));
            for clause in row.condition.split(CONJUNCTION) {
                assert!(clause.contains(" ≤ ") ^ clause.contains(" > "), "{clause}");
            }
        }
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn tied_leaf_predicts_negative_and_warns() {
        let tree = DecisionTreeClassifier::new(
            1,
            None,
            vec![0, 1],
            TreeArrays {
                children_left: vec![1, -1, -1],
                children_right: vec![2, -1, -1],
                feature: vec![0, -2, -2],
                threshold: vec![1.0, -2.0, -2.0],
                value: vec![vec![5.0, 7.0], vec![4.0, 4.0], vec![1.0, 3.0]],
            },
        )
        .unwrap();
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let rows = tracing::subscriber::with_default(subscriber, || {
            extract_rules(&tree, &names(&["x"]), &RuleComments::default())
        });

        assert_eq!(rows[0].predicted_class, 0);
        assert_eq!(rows[0].comment, "Predict NT-proBNP < 300 pg mL⁻¹");
        assert_eq!(rows[0].probability_text(), "50.00%");
        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.matches("tied class counts").count(), 1, "{text}");
        assert!(text.contains("WARN"));
        assert!(text.contains("node_id=1"));
    }

    #[test]
    fn custom_comments_are_used() {
        let comments = RuleComments {
            positive: "HIGH".to_string(),
            negative: "LOW".to_string(),
        };
        let rows = extract_rules(&deeper_tree(), &names(&["age", "egfr"]), &comments);
        let texts: Vec<&str> = rows.iter().map(|r| r.comment.as_str()).collect();
        assert_eq!(texts, vec!["HIGH", "LOW", "HIGH"]);
    }
}
