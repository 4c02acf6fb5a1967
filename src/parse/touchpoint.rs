// src/parse/touchpoint.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::rows::{coerce_label, coerce_number, RawRow};

/// Per-touchpoint issue breakdown by WCAG conformance level, with the
/// resolution-state columns when the export carries them.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TouchpointRow {
    pub name: String,
    pub a: i64,
    pub aa: i64,
    pub aaa: i64,
    /// Always `a + aa + aaa`; a total column in the export is never trusted.
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recheck: Option<i64>,
}

/// Case/accent/spacing-insensitive form of a column header, so that
/// "Gravità  A" and "gravita a" select the same column.
pub fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(fold_diacritic(c));
    }
    out
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        _ => c,
    }
}

// Column matchers run against normalized headers. Exports have shipped both
// "Gravità <level>" and "Segnalzioni Livello <level>" spellings.
static COL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^touchpoint$").expect("name column pattern should be valid"));
static COL_A: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(gravita|livello).*\ba\b|segnal\w*.*\blivello a\b")
        .expect("level A column pattern should be valid")
});
static COL_AA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(gravita|livello).*\baa\b|segnal\w*.*\blivello aa\b")
        .expect("level AA column pattern should be valid")
});
static COL_AAA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(gravita|livello).*\baaa\b|segnal\w*.*\blivello aaa\b")
        .expect("level AAA column pattern should be valid")
});
static COL_RESOLVED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"risolt[ei]\b").expect("resolved column pattern should be valid"));

/// First header of `row` whose normalized form the predicate accepts.
fn find_key<'r>(row: &'r RawRow, matches: impl Fn(&str) -> bool) -> Option<&'r str> {
    row.keys()
        .map(String::as_str)
        .find(|k| matches(&normalize_key(k)))
}

/// Count under `key`, with missing or unparseable cells coerced to 0.
fn count_at(row: &RawRow, key: Option<&str>) -> i64 {
    key.and_then(|k| row.get(k))
        .and_then(coerce_number)
        .map(|v| v as i64)
        .unwrap_or(0)
}

/// Classify the "Touchpoint" sheet: one output row per input row that has
/// a touchpoint name, columns located per row by header matching. The
/// resolution-state fields stay `None` when the row has no such column at
/// all. Results are ranked by WCAG total, descending.
pub fn parse_touchpoints(rows: &[RawRow]) -> Vec<TouchpointRow> {
    let mut out = Vec::new();

    for row in rows {
        if row.is_empty() {
            continue;
        }
        let name = find_key(row, |k| COL_NAME.is_match(k))
            .and_then(|k| row.get(k))
            .map(coerce_label)
            .unwrap_or_default();
        if name.is_empty() {
            debug!("skipping row without a touchpoint name");
            continue;
        }

        let a = count_at(row, find_key(row, |k| COL_A.is_match(k)));
        let aa = count_at(row, find_key(row, |k| COL_AA.is_match(k)));
        let aaa = count_at(row, find_key(row, |k| COL_AAA.is_match(k)));

        let unresolved =
            find_key(row, |k| k.contains("non risolt")).map(|k| count_at(row, Some(k)));
        let resolved = find_key(row, |k| COL_RESOLVED.is_match(k) && !k.contains("non risolt"))
            .map(|k| count_at(row, Some(k)));
        let recheck = find_key(row, |k| k.contains("recheck")).map(|k| count_at(row, Some(k)));

        out.push(TouchpointRow {
            name,
            a,
            aa,
            aaa,
            total: a + aa + aaa,
            unresolved,
            resolved,
            recheck,
        });
    }

    out.sort_by(|x, y| y.total.cmp(&x.total));
    out
}

/// Sort key for the touchpoint table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    Total,
    A,
    Aa,
    Aaa,
    Name,
}

/// Substring filter on normalized touchpoint names.
pub fn filter_rows(rows: &[TouchpointRow], query: &str) -> Vec<TouchpointRow> {
    let query = normalize_key(query);
    rows.iter()
        .filter(|r| normalize_key(&r.name).contains(&query))
        .cloned()
        .collect()
}

/// Reorder in place. Descending by default, ascending on request.
pub fn sort_rows(rows: &mut [TouchpointRow], key: SortKey, ascending: bool) {
    rows.sort_by(|x, y| {
        let ord = match key {
            SortKey::Total => x.total.cmp(&y.total),
            SortKey::A => x.a.cmp(&y.a),
            SortKey::Aa => x.aa.cmp(&y.aa),
            SortKey::Aaa => x.aaa.cmp(&y.aaa),
            SortKey::Name => x.name.cmp(&y.name),
        };
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}
