// src/parse/rows.rs

use serde_json::Value;

/// One exported spreadsheet line: column header → cell value.
///
/// Headers are not stable across export runs, and on the KPI sheets the
/// value column is headed by a literal number (a column named "459" holds
/// the counts). Key order is the sheet's column order.
pub type RawRow = serde_json::Map<String, Value>;

/// Numeric guard that works for headers like "459".
pub fn is_numeric_key(key: &str) -> bool {
    key.trim().parse::<f64>().is_ok()
}

/// Coerce a cell to a number. Strings are trimmed and parsed; anything
/// else that is not already a number yields `None`.
pub fn coerce_number(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a cell to a trimmed label string. `null` becomes empty.
pub fn coerce_label(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A label/value pair recovered from a row by column inference: the label
/// lives under the first non-numeric header, the value under the first
/// numeric one. Missing pieces degrade to an empty label and `None`, which
/// the classifiers then discard.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledCell {
    pub label: String,
    pub value: Option<f64>,
}

pub fn labeled_cell(row: &RawRow) -> LabeledCell {
    let label = row
        .keys()
        .find(|k| !is_numeric_key(k.as_str()))
        .and_then(|k| row.get(k.as_str()))
        .map(coerce_label)
        .unwrap_or_default();
    let value = row
        .keys()
        .find(|k| is_numeric_key(k.as_str()))
        .and_then(|k| row.get(k.as_str()))
        .and_then(coerce_number);
    LabeledCell { label, value }
}
