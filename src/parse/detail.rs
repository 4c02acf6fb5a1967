// src/parse/detail.rs

use serde::Serialize;
use serde_json::Value;

use super::rows::RawRow;

/// Normalized header of the one findings column that gets semantic
/// treatment; every other column is rendered verbatim.
pub const STATUS_HEADER: &str = "stato";

/// The findings sheet as displayed: headers come from the first row, in
/// sheet order, and rows are kept untouched.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct DetailSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl DetailSheet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn parse_detail(rows: &[RawRow]) -> DetailSheet {
    let headers = rows
        .first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default();
    DetailSheet {
        headers,
        rows: rows.to_vec(),
    }
}

/// Resolution state of a finding, recognized from the `Stato` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    ToFix,
    InProgress,
    Resolved,
    Other,
}

impl Status {
    pub fn classify(cell: &str) -> Status {
        match cell.trim().to_lowercase().as_str() {
            "da risolvere" | "non risolto" => Status::ToFix,
            "in corso" | "da testare nel codice" => Status::InProgress,
            "risolto dal team" | "risolto e verificato" => Status::Resolved,
            _ => Status::Other,
        }
    }

    /// Terminal stand-in for the colored status badge.
    pub fn marker(self) -> &'static str {
        match self {
            Status::ToFix => "✖",
            Status::InProgress => "◐",
            Status::Resolved => "✔",
            Status::Other => "",
        }
    }
}

/// Verbatim cell text; `null` renders empty.
pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn headers_come_from_the_first_row_in_sheet_order() {
        let rows: Vec<RawRow> = vec![
            json!({ "Pagina": "Home", "Problema": "contrasto", "Stato": "In corso" })
                .as_object()
                .unwrap()
                .clone(),
        ];
        let sheet = parse_detail(&rows);
        assert_eq!(sheet.headers, ["Pagina", "Problema", "Stato"]);
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn empty_input_yields_an_empty_sheet() {
        let sheet = parse_detail(&[]);
        assert!(sheet.is_empty());
        assert!(sheet.headers.is_empty());
    }

    #[test]
    fn known_statuses_classify_case_insensitively() {
        assert_eq!(Status::classify("Da risolvere"), Status::ToFix);
        assert_eq!(Status::classify("NON RISOLTO"), Status::ToFix);
        assert_eq!(Status::classify("in corso"), Status::InProgress);
        assert_eq!(Status::classify("Da testare nel codice"), Status::InProgress);
        assert_eq!(Status::classify("Risolto dal team"), Status::Resolved);
        assert_eq!(Status::classify(" risolto e verificato "), Status::Resolved);
        assert_eq!(Status::classify("boh"), Status::Other);
        assert_eq!(Status::classify(""), Status::Other);
    }

    #[test]
    fn cells_render_verbatim_and_null_renders_empty() {
        assert_eq!(cell_text(&json!("testo")), "testo");
        assert_eq!(cell_text(&json!(12)), "12");
        assert_eq!(cell_text(&json!(null)), "");
    }
}
