// reelstar-core/src/domain/transform/mod.rs

pub mod clean;
pub mod explode;
pub mod normalize;
pub mod star;

use serde::Serialize;
use tracing::instrument;

use crate::domain::project::TransformPlan;
use crate::domain::record::RawTable;

pub use clean::{CleaningReport, clean_records};
pub use explode::{ExplosionReport, explode_categories};
pub use normalize::{NormalizationReport, normalize_records, parse_date};
pub use star::{
    BuildReport, CategoryRow, ColumnKind, EntityColumn, EntityRow, JunctionRow, StarSchema,
    build_star_schema,
};

/// Non-fatal findings of every stage of one run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DataQualityReport {
    pub cleaning: CleaningReport,
    pub normalization: NormalizationReport,
    pub explosion: ExplosionReport,
    pub build: BuildReport,
}

impl DataQualityReport {
    /// Human readable lines, one per non-zero finding.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (field, count) in &self.cleaning.missing_by_field {
            if *count > 0 {
                out.push(format!("{count} record(s) missing required field '{field}'"));
            }
        }
        if self.cleaning.duplicates_dropped > 0 {
            out.push(format!(
                "{} exact duplicate record(s) removed",
                self.cleaning.duplicates_dropped
            ));
        }
        for (field, count) in &self.normalization.invalid_dates {
            if *count > 0 {
                out.push(format!("{count} unparseable date(s) in '{field}' loaded as NULL"));
            }
        }
        for field in &self.normalization.text_fields_skipped {
            out.push(format!("text field '{field}' not present in source"));
        }
        let unkeyed = self.build.unkeyed_records;
        if unkeyed > 0 {
            out.push(format!("{unkeyed} record(s) without an id skipped"));
        }
        if self.build.duplicate_entity_ids > 0 {
            out.push(format!(
                "{} record(s) reuse an existing id, first occurrence kept",
                self.build.duplicate_entity_ids
            ));
        }
        if self.build.unresolved_associations > 0 {
            out.push(format!(
                "{} association(s) dropped for unresolved keys",
                self.build.unresolved_associations
            ));
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub schema: StarSchema,
    pub report: DataQualityReport,
}

/// clean -> normalize -> explode -> build. Each stage owns the previous
/// stage's output.
#[instrument(name = "transform", skip_all, fields(records = table.records.len()))]
pub fn transform(table: RawTable, plan: &TransformPlan) -> TransformOutput {
    let (cleaned, cleaning) = clean_records(table, &plan.required);
    let (normalized, normalization) = normalize_records(cleaned, plan);
    let (exploded, explosion) = explode_categories(&normalized, plan);
    let (schema, build) = build_star_schema(&normalized, &exploded, plan);

    TransformOutput {
        schema,
        report: DataQualityReport {
            cleaning,
            normalization,
            explosion,
            build,
        },
    }
}
