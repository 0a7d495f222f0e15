use std::path::Path;

use super::walker::RuleRow;
use crate::output::{OutputError, write_csv_atomic};

/// Header row of the rule CSV.
pub const RULE_HEADER: [&str; 3] = ["rule", "comment", "leaf_probability"];

/// Write rules to `path` in traversal order, returning the number of rows.
pub fn write_rules_csv(path: &Path, rows: &[RuleRow]) -> Result<usize, OutputError> {
    write_csv_atomic(path, |writer| {
        writer.write_record(RULE_HEADER)?;
        for row in rows {
            writer.write_record([
                row.condition.as_str(),
                row.comment.as_str(),
                row.probability_text().as_str(),
            ])?;
        }
        Ok(())
    })?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_header_and_rows_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.csv");
        let rows = vec![
            RuleRow {
                condition: "a ≤ 1 AND b > 2".to_string(),
                comment: "yes".to_string(),
                leaf_probability: 0.875,
                predicted_class: 1,
            },
            RuleRow {
                condition: "a > 1".to_string(),
                comment: "no, really".to_string(),
                leaf_probability: 0.0,
                predicted_class: 0,
            },
        ];
        let written = write_rules_csv(&path, &rows).unwrap();
        assert_eq!(written, 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "rule,comment,leaf_probability\n\
             a ≤ 1 AND b > 2,yes,87.50%\n\
             a > 1,\"no, really\",0.00%\n"
        );
    }

    #[test]
    fn empty_rule_set_still_writes_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.csv");
        assert_eq!(write_rules_csv(&path, &[]).unwrap(), 0);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "rule,comment,leaf_probability\n"
        );
    }
}
