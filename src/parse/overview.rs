// src/parse/overview.rs

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use super::rows::{labeled_cell, RawRow};

/// KPI labels the overview cards pick out of the totals map.
pub const KPI_TOTAL_ISSUES: &str = "Totale Segnalazioni";
pub const KPI_TOUCHPOINTS_TO_TEST: &str = "Totale touchpoint da testare";
pub const KPI_TOUCHPOINTS_TESTED: &str = "Totale touchpoint testati";

/// One conformance-level tally ("A", "AA", "AAA").
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LevelBucket {
    pub level: String,
    pub count: i64,
}

/// Issue count for one touchpoint, as tallied on the overview sheet.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TouchpointCount {
    pub name: String,
    pub count: i64,
}

/// Everything the "Panoramica" sheet carries: the opening KPI block, the
/// per-level tallies, and the per-touchpoint tallies.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct OverviewReport {
    pub totals: BTreeMap<String, i64>,
    pub level_dist: Vec<LevelBucket>,
    pub touchpoints: Vec<TouchpointCount>,
}

impl OverviewReport {
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty() && self.level_dist.is_empty() && self.touchpoints.is_empty()
    }
}

/// Cursor over the flat row list. The sheet opens with KPI rows; a divider
/// row introduces the per-level tallies, a second one the per-touchpoint
/// tallies. Dividers only ever move the cursor forward through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Kpi,
    Levels,
    Touchpoints,
}

impl Section {
    /// Divider detection is case-insensitive substring matching: source
    /// sheets have shipped headings like "Distribuzione Segnalzioni per
    /// Touchpoint", so exact labels cannot be relied on. The level check
    /// runs first since both words can appear in one heading.
    fn transition(label: &str) -> Option<Section> {
        let label = label.to_lowercase();
        if !label.contains("distribuzione") {
            return None;
        }
        if label.contains("livello") {
            Some(Section::Levels)
        } else if label.contains("touchpoint") {
            Some(Section::Touchpoints)
        } else {
            None
        }
    }
}

/// Classify the "Panoramica" rows in one left-to-right scan.
///
/// Each row is reduced against the current section cursor: divider rows
/// move the cursor and carry no data, rows without a usable label/value
/// pair are dropped, everything else lands in the collection the cursor
/// points at. Touchpoints are then cleaned up and ranked by count.
pub fn parse_overview(rows: &[RawRow]) -> OverviewReport {
    let (mut report, _) = rows
        .iter()
        .fold((OverviewReport::default(), Section::Kpi), reduce);

    report.touchpoints.retain(|t| !t.name.is_empty() && t.count >= 0);
    report.touchpoints.sort_by(|a, b| b.count.cmp(&a.count));
    report
}

fn reduce(
    (mut report, section): (OverviewReport, Section),
    row: &RawRow,
) -> (OverviewReport, Section) {
    if row.is_empty() {
        return (report, section);
    }
    let cell = labeled_cell(row);

    // blank spacer rows: no label and no meaningful value
    if cell.label.is_empty() && cell.value.map_or(true, |v| v == 0.0) {
        return (report, section);
    }

    if let Some(next) = Section::transition(&cell.label) {
        trace!(divider = %cell.label, ?next, "section divider");
        return (report, next);
    }

    let value = match cell.value {
        Some(v) if !cell.label.is_empty() && cell.label != "-" => v,
        _ => {
            trace!(label = %cell.label, "dropping row without usable label/value");
            return (report, section);
        }
    };

    match section {
        Section::Kpi => {
            report.totals.insert(cell.label, value as i64);
        }
        Section::Levels => report.level_dist.push(LevelBucket {
            level: cell.label,
            count: value as i64,
        }),
        Section::Touchpoints => report.touchpoints.push(TouchpointCount {
            name: cell.label,
            count: value as i64,
        }),
    }
    (report, section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn rows(value: Value) -> Vec<RawRow> {
        value
            .as_array()
            .expect("test rows must be an array")
            .iter()
            .map(|r| r.as_object().expect("test row must be an object").clone())
            .collect()
    }

    #[test]
    fn kpi_rows_land_in_totals() {
        let report = parse_overview(&rows(json!([
            { "Livello": "Totale Segnalazioni", "459": 459 }
        ])));
        assert_eq!(report.totals.get(KPI_TOTAL_ISSUES), Some(&459));
        assert!(report.level_dist.is_empty());
        assert!(report.touchpoints.is_empty());
    }

    #[test]
    fn without_dividers_everything_is_a_kpi() {
        let report = parse_overview(&rows(json!([
            { "Livello": "Totale Segnalazioni", "459": 459 },
            { "Livello": "Totale touchpoint da testare", "459": 31 },
            { "Livello": "Totale touchpoint testati", "459": 26 }
        ])));
        assert_eq!(report.totals.len(), 3);
        assert!(report.level_dist.is_empty());
        assert!(report.touchpoints.is_empty());
    }

    #[test]
    fn level_divider_reroutes_following_rows() {
        let report = parse_overview(&rows(json!([
            { "Livello": "Distribuzione per Livello", "459": 0 },
            { "Livello": "A", "459": 120 },
            { "Livello": "AA", "459": 200 }
        ])));
        assert!(report.totals.is_empty());
        assert_eq!(
            report.level_dist,
            vec![
                LevelBucket { level: "A".into(), count: 120 },
                LevelBucket { level: "AA".into(), count: 200 },
            ]
        );
    }

    #[test]
    fn divider_typos_are_tolerated() {
        let report = parse_overview(&rows(json!([
            { "Livello": "Totale Segnalazioni", "459": 459 },
            { "Livello": "Distribuzione per Livello di conformità", "459": 0 },
            { "Livello": "A", "459": 10 },
            { "Livello": "Distribuzione Segnalzioni per Touchpoint", "459": 0 },
            { "Livello": "Home", "459": 80 },
            { "Livello": "Area riservata", "459": 120 }
        ])));
        assert_eq!(report.totals.len(), 1);
        assert_eq!(report.level_dist.len(), 1);
        // ranked by count, descending
        assert_eq!(
            report.touchpoints,
            vec![
                TouchpointCount { name: "Area riservata".into(), count: 120 },
                TouchpointCount { name: "Home".into(), count: 80 },
            ]
        );
    }

    #[test]
    fn blank_dash_and_unparseable_rows_are_dropped() {
        let report = parse_overview(&rows(json!([
            {},
            { "Livello": "", "459": 0 },
            { "Livello": "-", "459": 12 },
            { "Livello": "Senza valore" },
            { "Livello": "Non numerico", "459": "n/d" },
            { "Livello": "Totale Segnalazioni", "459": 459 }
        ])));
        assert_eq!(report.totals.len(), 1);
        assert_eq!(report.totals.get(KPI_TOTAL_ISSUES), Some(&459));
    }

    #[test]
    fn zero_counts_inside_a_section_are_kept() {
        let report = parse_overview(&rows(json!([
            { "Livello": "Distribuzione per Livello", "459": 0 },
            { "Livello": "AAA", "459": 0 }
        ])));
        assert_eq!(
            report.level_dist,
            vec![LevelBucket { level: "AAA".into(), count: 0 }]
        );
    }

    #[test]
    fn duplicate_kpi_labels_keep_the_last_value() {
        let report = parse_overview(&rows(json!([
            { "Livello": "Totale Segnalazioni", "459": 1 },
            { "Livello": "Totale Segnalazioni", "459": 2 }
        ])));
        assert_eq!(report.totals.get(KPI_TOTAL_ISSUES), Some(&2));
    }

    #[test]
    fn touchpoint_ties_keep_input_order() {
        let report = parse_overview(&rows(json!([
            { "Livello": "Distribuzione segnalazioni per Touchpoint", "459": 0 },
            { "Livello": "Primo", "459": 50 },
            { "Livello": "Secondo", "459": 50 },
            { "Livello": "Terzo", "459": 50 }
        ])));
        let names: Vec<&str> = report.touchpoints.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Primo", "Secondo", "Terzo"]);
    }
}
