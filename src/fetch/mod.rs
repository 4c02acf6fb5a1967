// src/fetch/mod.rs

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// How the export wraps its sheets. The storage service nests them under
/// `value.data`; the spreadsheet script puts them at the payload root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Storage,
    Direct,
}

/// Module for retrieving one named sheet from an export endpoint
pub mod sheets {
    use super::*;
    use crate::parse::RawRow;
    use tracing::{debug, info};

    /// GET the export and pull out the rows of `sheet`. A missing sheet, a
    /// non-array sheet, or a missing envelope member is a malformed payload.
    pub async fn fetch_sheet(
        client: &Client,
        url: &Url,
        envelope: Envelope,
        sheet: &str,
    ) -> Result<Vec<RawRow>> {
        debug!(%url, sheet, "fetching sheet export");
        let payload: Value = client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("non-success status from {}", url))?
            .json()
            .await
            .with_context(|| format!("decoding JSON body from {}", url))?;

        let rows = extract_sheet(&payload, envelope, sheet)?;
        info!(sheet, rows = rows.len(), "sheet extracted");
        Ok(rows)
    }

    /// Unwrap the payload envelope and return the row objects of `sheet`.
    /// Array entries that are not objects are dropped.
    pub fn extract_sheet(payload: &Value, envelope: Envelope, sheet: &str) -> Result<Vec<RawRow>> {
        let sheets = match envelope {
            Envelope::Storage => payload.get("value").and_then(|v| v.get("data")),
            Envelope::Direct => Some(payload),
        };
        let rows = sheets
            .and_then(|s| s.get(sheet))
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("foglio `{}` non trovato o non valido", sheet))?;
        Ok(rows.iter().filter_map(|r| r.as_object().cloned()).collect())
    }
}

/// Module for triggering a remote regeneration of the export
pub mod refresh {
    use super::*;
    use reqwest::header::ACCEPT;
    use tracing::info;

    /// Fire the regeneration job. Success is a 2xx status; the body is not
    /// consumed. View data is unaffected until the next fetch.
    pub async fn trigger(client: &Client, url: &Url) -> Result<()> {
        info!(%url, "triggering export regeneration");
        client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("refresh request to {} failed", url))?
            .error_for_status()
            .context("refresh endpoint returned a non-success status")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::sheets::extract_sheet;
    use super::Envelope;
    use serde_json::json;

    #[test]
    fn storage_envelope_unwraps_value_data() {
        let payload = json!({
            "value": { "data": { "Panoramica": [ { "Livello": "Totale", "459": 459 } ] } }
        });
        let rows = extract_sheet(&payload, Envelope::Storage, "Panoramica").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["459"], json!(459));
    }

    #[test]
    fn direct_envelope_reads_payload_root() {
        let payload = json!({ "Report Pagine Sito Istituzionale": [ { "Stato": "In corso" } ] });
        let rows =
            extract_sheet(&payload, Envelope::Direct, "Report Pagine Sito Istituzionale").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn missing_sheet_is_an_error() {
        let payload = json!({ "value": { "data": {} } });
        let err = extract_sheet(&payload, Envelope::Storage, "Panoramica").unwrap_err();
        assert!(err.to_string().contains("Panoramica"));
    }

    #[test]
    fn non_array_sheet_is_an_error() {
        let payload = json!({ "value": { "data": { "Panoramica": { "not": "rows" } } } });
        assert!(extract_sheet(&payload, Envelope::Storage, "Panoramica").is_err());
    }

    #[test]
    fn missing_envelope_member_is_an_error() {
        let payload = json!({ "Panoramica": [] });
        assert!(extract_sheet(&payload, Envelope::Storage, "Panoramica").is_err());
    }

    #[test]
    fn non_object_entries_are_dropped() {
        let payload = json!({ "Touchpoint": [ { "Touchpoint": "Home" }, "spurious", 42 ] });
        let rows = extract_sheet(&payload, Envelope::Direct, "Touchpoint").unwrap();
        assert_eq!(rows.len(), 1);
    }
}
