use serde_json::Value as JsonValue;
use std::collections::HashSet;

/// Flatten the array held in `column` across all rows into a list of unique
/// strings, in first-seen order.
///
/// Rows without the column, or where it is not an array, are skipped, as are
/// non-string entries.
pub fn unique_column_values(rows: &[JsonValue], column: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    let values = rows
        .iter()
        .filter_map(|row| row.get(column)?.as_array())
        .flatten()
        .filter_map(JsonValue::as_str);

    for value in values {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }

    out
}
