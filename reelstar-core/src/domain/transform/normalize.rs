// reelstar-core/src/domain/transform/normalize.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{info, instrument, warn};

use crate::domain::project::TransformPlan;
use crate::domain::record::{Cell, RecordTable};

fn re_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap_or_else(|_| unreachable!()))
}

/// Calendar formats tried in order. Slash dates are read month first.
const DATE_FORMATS: [&str; 11] = [
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d-%b-%Y",
    "%d-%B-%Y",
];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct NormalizationReport {
    pub dates_normalized: usize,
    /// Date cells left as an invalid marker, per field.
    pub invalid_dates: BTreeMap<String, usize>,
    pub text_fields_trimmed: Vec<String>,
    pub text_fields_skipped: Vec<String>,
}

impl NormalizationReport {
    pub fn total_invalid_dates(&self) -> usize {
        self.invalid_dates.values().sum()
    }
}

/// Parses a free-form date. Internal whitespace runs are collapsed first and
/// any time component is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let collapsed = re_whitespace().replace_all(raw.trim(), " ");
    let value = collapsed.as_ref();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// `Text` becomes `Date` or `InvalidDate`; blank text becomes `Null`. Any
/// other cell is already normalized.
pub fn normalize_date(cell: Cell) -> Cell {
    match cell {
        Cell::Text(raw) => {
            if raw.trim().is_empty() {
                Cell::Null
            } else {
                match parse_date(&raw) {
                    Some(date) => Cell::Date(date),
                    None => Cell::InvalidDate(raw),
                }
            }
        }
        other => other,
    }
}

/// Leading and trailing whitespace only; case is preserved.
pub fn normalize_text(cell: Cell) -> Cell {
    match cell {
        Cell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.len() == s.len() {
                Cell::Text(s)
            } else {
                Cell::Text(trimmed.to_string())
            }
        }
        other => other,
    }
}

/// Date fields first, then text fields and the category field. Running it
/// twice yields the same table and the same report.
#[instrument(skip_all, fields(records = table.records.len()))]
pub fn normalize_records(
    mut table: RecordTable,
    plan: &TransformPlan,
) -> (RecordTable, NormalizationReport) {
    let mut report = NormalizationReport {
        invalid_dates: plan.dates.iter().map(|f| (f.name.clone(), 0)).collect(),
        text_fields_skipped: plan.skipped_text.clone(),
        ..NormalizationReport::default()
    };

    let mut text_indices: Vec<usize> = plan
        .text
        .iter()
        .filter(|f| !plan.is_date_field(f.index))
        .map(|f| f.index)
        .collect();
    if !text_indices.contains(&plan.category.index) {
        text_indices.push(plan.category.index);
    }
    report.text_fields_trimmed = plan
        .text
        .iter()
        .filter(|f| !plan.is_date_field(f.index))
        .map(|f| f.name.clone())
        .collect();
    if !report.text_fields_trimmed.contains(&plan.category.name) {
        report.text_fields_trimmed.push(plan.category.name.clone());
    }

    for record in &mut table.records {
        for field in &plan.dates {
            if let Some(cell) = record.cells.get_mut(field.index) {
                let normalized = normalize_date(std::mem::replace(cell, Cell::Null));
                match &normalized {
                    Cell::Date(_) => report.dates_normalized += 1,
                    Cell::InvalidDate(_) => {
                        *report.invalid_dates.entry(field.name.clone()).or_default() += 1;
                    }
                    _ => {}
                }
                *cell = normalized;
            }
        }
        for &index in &text_indices {
            if let Some(cell) = record.cells.get_mut(index) {
                *cell = normalize_text(std::mem::replace(cell, Cell::Null));
            }
        }
    }

    for (field, count) in &report.invalid_dates {
        if *count > 0 {
            warn!(field = %field, count, "Unparseable dates kept as invalid markers");
        }
    }
    info!(
        dates = report.dates_normalized,
        invalid = report.total_invalid_dates(),
        "Normalization completed"
    );

    (table, report)
}
