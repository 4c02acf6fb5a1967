pub mod detail;
pub mod overview;
pub mod rows;
pub mod touchpoint;

pub use detail::{cell_text, parse_detail, DetailSheet, Status, STATUS_HEADER};
pub use overview::{
    parse_overview, LevelBucket, OverviewReport, TouchpointCount, KPI_TOTAL_ISSUES,
    KPI_TOUCHPOINTS_TESTED, KPI_TOUCHPOINTS_TO_TEST,
};
pub use rows::{coerce_label, coerce_number, is_numeric_key, labeled_cell, LabeledCell, RawRow};
pub use touchpoint::{
    filter_rows, normalize_key, parse_touchpoints, sort_rows, SortKey, TouchpointRow,
};
