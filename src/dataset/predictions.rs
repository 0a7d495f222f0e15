use std::path::Path;

use super::loader::LabeledTable;
use crate::output::{OutputError, write_csv_atomic};

/// Write the original feature columns plus one probability column.
///
/// The label column is not part of the output. `probabilities` must hold one
/// value per table row.
pub fn write_predictions_csv(
    path: &Path,
    table: &LabeledTable,
    probabilities: &[f64],
    probability_column: &str,
) -> Result<(), OutputError> {
    write_csv_atomic(path, |writer| {
        let mut header: Vec<&str> = table.feature_columns.iter().map(String::as_str).collect();
        header.push(probability_column);
        writer.write_record(&header)?;
        for (row, &prob) in table.rows.iter().zip(probabilities) {
            let prob = format_probability(prob);
            writer.write_record(row.iter().map(String::as_str).chain([prob.as_str()]))?;
        }
        Ok(())
    })
}

/// Shortest round-trip form of a probability.
///
/// Decimal exponents below -4 or from 16 up switch to scientific notation
/// with a signed two-digit exponent (`1e-05`); otherwise plain decimals keep
/// a `.0` on integral values.
pub fn format_probability(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if value != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs());
    }
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}
