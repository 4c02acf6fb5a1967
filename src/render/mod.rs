// src/render/mod.rs
//
// Stateless presentation of the parsed structures: KPI cards, textual
// progress bars, and markdown tables for the terminal.

use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::parse::{
    cell_text, DetailSheet, OverviewReport, Status, TouchpointRow, KPI_TOTAL_ISSUES,
    KPI_TOUCHPOINTS_TESTED, KPI_TOUCHPOINTS_TO_TEST, STATUS_HEADER,
};

/// Empty-state message, shown instead of an empty table.
pub const NO_DATA: &str = "Nessun dato disponibile";

/// Italian-locale count formatting: dot as thousands separator.
pub fn fmt_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn fmt_pct(share: f64) -> String {
    format!("{share:.1}%")
}

/// Textual progress bar for a 0..=100 share.
fn bar(share: f64, width: usize) -> String {
    let filled = ((share / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn render_overview(report: &OverviewReport) -> String {
    if report.is_empty() {
        return format!("{NO_DATA}\n");
    }
    let mut out = String::new();
    out.push_str("📊 Panoramica\n\n");

    // KPI cards: the three headline figures first, then whatever else the
    // opening block carried.
    let headline = [KPI_TOTAL_ISSUES, KPI_TOUCHPOINTS_TO_TEST, KPI_TOUCHPOINTS_TESTED];
    for key in headline {
        if let Some(v) = report.totals.get(key) {
            out.push_str(&format!("  {:<42} {:>10}\n", key, fmt_count(*v)));
        }
    }
    for (key, v) in &report.totals {
        if !headline.contains(&key.as_str()) {
            out.push_str(&format!("  {:<42} {:>10}\n", key, fmt_count(*v)));
        }
    }

    if let (Some(&tested), Some(&to_test)) = (
        report.totals.get(KPI_TOUCHPOINTS_TESTED),
        report.totals.get(KPI_TOUCHPOINTS_TO_TEST),
    ) {
        if tested > 0 && to_test > 0 {
            let coverage = (tested as f64 / to_test as f64 * 100.0).min(100.0);
            out.push_str(&format!(
                "\n  Copertura test  {} {}\n",
                bar(coverage, 20),
                fmt_pct(coverage)
            ));
        }
    }

    if !report.level_dist.is_empty() {
        out.push_str("\nDistribuzione per livello di conformità\n");
        let total: i64 = report.level_dist.iter().map(|b| b.count).sum();
        for bucket in &report.level_dist {
            let share = if total > 0 {
                (bucket.count as f64 / total as f64 * 100.0).min(100.0)
            } else {
                0.0
            };
            out.push_str(&format!(
                "  {:<6} {:>10}  {} {}\n",
                bucket.level,
                fmt_count(bucket.count),
                bar(share, 20),
                fmt_pct(share)
            ));
        }
    }

    if !report.touchpoints.is_empty() {
        out.push_str("\nDistribuzione segnalazioni per touchpoint\n");
        let denom = report.totals.get(KPI_TOTAL_ISSUES).copied().unwrap_or(0);
        let mut builder = Builder::default();
        builder.push_record(["Touchpoint", "Segnalazioni", "Distribuzione"]);
        for t in &report.touchpoints {
            let share = if denom > 0 {
                (t.count as f64 / denom as f64 * 100.0).min(100.0)
            } else {
                0.0
            };
            builder.push_record([
                t.name.clone(),
                fmt_count(t.count),
                format!("{} {}", bar(share, 16), fmt_pct(share)),
            ]);
        }
        let mut table = builder.build();
        table.with(Style::markdown());
        out.push_str(&table.to_string());
        out.push('\n');
    }

    out
}

#[derive(Tabled)]
struct TouchpointLine {
    #[tabled(rename = "Touchpoint")]
    name: String,
    #[tabled(rename = "A")]
    a: String,
    #[tabled(rename = "AA")]
    aa: String,
    #[tabled(rename = "AAA")]
    aaa: String,
    #[tabled(rename = "Conteggio WCAG")]
    total: String,
    #[tabled(rename = "Non risolte")]
    unresolved: String,
    #[tabled(rename = "Recheck")]
    recheck: String,
    #[tabled(rename = "Risolte")]
    resolved: String,
}

pub fn render_touchpoints(rows: &[TouchpointRow]) -> String {
    if rows.is_empty() {
        return format!("{NO_DATA}\n");
    }
    let mut out = String::new();
    out.push_str("🔥 Touchpoint per livello\n\n");

    let a: i64 = rows.iter().map(|r| r.a).sum();
    let aa: i64 = rows.iter().map(|r| r.aa).sum();
    let aaa: i64 = rows.iter().map(|r| r.aaa).sum();
    let total: i64 = rows.iter().map(|r| r.total).sum();
    let unresolved: i64 = rows.iter().filter_map(|r| r.unresolved).sum();
    out.push_str(&format!(
        "  Totale A: {}  ·  AA: {}  ·  AAA: {}  ·  Livelli: {}  ·  Non risolte: {}\n\n",
        fmt_count(a),
        fmt_count(aa),
        fmt_count(aaa),
        fmt_count(total),
        fmt_count(unresolved)
    ));

    let lines: Vec<TouchpointLine> = rows
        .iter()
        .map(|r| TouchpointLine {
            name: r.name.clone(),
            a: fmt_count(r.a),
            aa: fmt_count(r.aa),
            aaa: fmt_count(r.aaa),
            total: fmt_count(r.total),
            unresolved: r.unresolved.map(fmt_count).unwrap_or_default(),
            recheck: r.recheck.map(fmt_count).unwrap_or_default(),
            resolved: r.resolved.map(fmt_count).unwrap_or_default(),
        })
        .collect();
    let mut table = Table::new(lines);
    table.with(Style::markdown());
    out.push_str(&table.to_string());
    out.push('\n');
    out
}

pub fn render_detail(sheet: &DetailSheet) -> String {
    if sheet.is_empty() {
        return format!("{NO_DATA}\n");
    }
    let mut out = String::new();
    out.push_str("📋 Dettaglio Segnalazioni\n\n");

    let mut builder = Builder::default();
    builder.push_record(sheet.headers.iter().cloned());
    for row in &sheet.rows {
        builder.push_record(sheet.headers.iter().map(|header| {
            let text = row.get(header).map(cell_text).unwrap_or_default();
            if header.to_lowercase() == STATUS_HEADER {
                let marker = Status::classify(&text).marker();
                if marker.is_empty() {
                    text
                } else {
                    format!("{marker} {text}")
                }
            } else {
                text
            }
        }));
    }
    let mut table = builder.build();
    table.with(Style::markdown());
    out.push_str(&table.to_string());
    out.push('\n');
    out
}
