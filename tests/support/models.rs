use std::path::{Path, PathBuf};

use ntprobnp_dss::ml::tree::{DecisionTreeClassifier, TreeArrays};

/// `x <= 0 → 6:2`, `x > 0 → 1:3`.
pub fn depth_one_model(names: Option<Vec<String>>) -> DecisionTreeClassifier {
    DecisionTreeClassifier::new(
        1,
        names,
        vec![0, 1],
        TreeArrays {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![0.0, -2.0, -2.0],
            value: vec![vec![7.0, 5.0], vec![6.0, 2.0], vec![1.0, 3.0]],
        },
    )
    .expect("valid depth-one tree")
}

/// Two-level tree over `age` and `egfr`.
pub fn clinical_model(names: Option<Vec<String>>) -> DecisionTreeClassifier {
    DecisionTreeClassifier::new(
        2,
        names,
        vec![0, 1],
        TreeArrays {
            children_left: vec![1, 2, -1, -1, 5, -1, -1],
            children_right: vec![4, 3, -1, -1, 6, -1, -1],
            feature: vec![0, 1, -2, -2, 1, -2, -2],
            threshold: vec![72.5, 58.7, -2.0, -2.0, 1234.0, -2.0, -2.0],
            value: vec![
                vec![50.0, 50.0],
                vec![30.0, 20.0],
                vec![5.0, 15.0],
                vec![25.0, 5.0],
                vec![20.0, 30.0],
                vec![12.0, 12.0],
                vec![8.0, 18.0],
            ],
        },
    )
    .expect("valid clinical tree")
}

pub fn names(list: &[&str]) -> Option<Vec<String>> {
    Some(list.iter().map(|s| s.to_string()).collect())
}

pub fn write_model(dir: &Path, file_name: &str, model: &DecisionTreeClassifier) -> PathBuf {
    let path = dir.join(file_name);
    model.save_json(&path).expect("write model fixture");
    path
}
