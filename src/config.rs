// src/config.rs

use url::Url;

/// Sheets consumed from the exported workbook.
pub const SHEET_OVERVIEW: &str = "Panoramica";
pub const SHEET_TOUCHPOINTS: &str = "Touchpoint";
pub const SHEET_DETAILS: &str = "Report Pagine Sito Istituzionale";

/// Storage export serving the "Panoramica" and "Touchpoint" sheets,
/// wrapped in the `value.data` envelope.
const STORAGE_EXPORT_URL: &str = "https://api.accessibilitydays.it/json-storages/excel-be";

/// Spreadsheet-script export serving the findings sheet, sheets at the
/// payload root.
const SHEET_SCRIPT_URL: &str =
    "https://script.google.com/macros/s/AKfycbzKBulKgKMUZ0JKp89x2xhlZtA4covcQQOq5fw7SsHL8j0FTLLayvmZuiCuqR4pnHAG/exec";

/// Regeneration trigger. Status-only contract: the response body is ignored.
const REFRESH_SCRIPT_URL: &str =
    "https://script.google.com/macros/s/AKfycbxn1qGmWQ2JttpCrXyi4dMT0uH9dknnvDE53eBIhxVSmUyP2ZQwbopyq0aefDV27fxI/exec";

/// Remote endpoints for one run. Defaults are the production exports; the
/// CLI can override each one individually.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_url: Url,
    pub detail_url: Url,
    pub refresh_url: Url,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_url: Url::parse(STORAGE_EXPORT_URL).expect("storage export URL should be valid"),
            detail_url: Url::parse(SHEET_SCRIPT_URL).expect("sheet script URL should be valid"),
            refresh_url: Url::parse(REFRESH_SCRIPT_URL).expect("refresh URL should be valid"),
        }
    }
}
