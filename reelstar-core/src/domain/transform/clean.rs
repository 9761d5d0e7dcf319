// reelstar-core/src/domain/transform/clean.rs

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, instrument, warn};

use crate::domain::project::FieldRef;
use crate::domain::record::{RawRecord, RawTable, Record, RecordTable};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CleaningReport {
    pub input_records: usize,
    /// Records lacking a value, per required field. A record missing two
    /// fields shows up under both.
    pub missing_by_field: BTreeMap<String, usize>,
    pub records_dropped_missing: usize,
    pub duplicates_dropped: usize,
    pub output_records: usize,
}

/// Drops records missing a required field, then exact duplicates (first
/// occurrence wins). Input order is preserved.
#[instrument(skip_all, fields(records = table.records.len()))]
pub fn clean_records(table: RawTable, required: &[FieldRef]) -> (RecordTable, CleaningReport) {
    let mut report = CleaningReport {
        input_records: table.records.len(),
        missing_by_field: required.iter().map(|f| (f.name.clone(), 0)).collect(),
        ..CleaningReport::default()
    };

    let mut seen: HashSet<RawRecord> = HashSet::with_capacity(table.records.len());
    let mut records = Vec::with_capacity(table.records.len());

    for raw in table.records {
        let mut complete = true;
        for field in required {
            if raw.is_missing(field.index) {
                complete = false;
                *report.missing_by_field.entry(field.name.clone()).or_default() += 1;
            }
        }
        if !complete {
            report.records_dropped_missing += 1;
            continue;
        }

        if seen.contains(&raw) {
            report.duplicates_dropped += 1;
            continue;
        }
        seen.insert(raw.clone());
        records.push(Record::from(raw));
    }

    report.output_records = records.len();

    for (field, count) in &report.missing_by_field {
        if *count > 0 {
            warn!(field = %field, count, "Records dropped for missing required value");
        }
    }
    info!(
        kept = report.output_records,
        missing = report.records_dropped_missing,
        duplicates = report.duplicates_dropped,
        "Cleaning completed"
    );

    (
        RecordTable {
            schema: table.schema,
            records,
        },
        report,
    )
}
