// reelstar-core/src/domain/transform/explode.rs

use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

use crate::domain::project::TransformPlan;
use crate::domain::record::{ExplodedRecord, RecordTable};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ExplosionReport {
    pub input_records: usize,
    pub exploded_records: usize,
    pub duplicate_pairs_dropped: usize,
    pub records_without_categories: usize,
    /// Records skipped because their natural id is blank.
    pub unkeyed_records: usize,
}

/// Splits a category list, trimming tokens and dropping empty ones.
pub fn split_categories<'a>(value: &'a str, delimiter: &'a str) -> impl Iterator<Item = &'a str> {
    value
        .split(delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// One pair per (entity, category), grouped by record order then token
/// order. Pairs repeated anywhere in the table are emitted once.
#[instrument(skip_all, fields(records = table.records.len()))]
pub fn explode_categories(
    table: &RecordTable,
    plan: &TransformPlan,
) -> (Vec<ExplodedRecord>, ExplosionReport) {
    let mut report = ExplosionReport {
        input_records: table.records.len(),
        ..ExplosionReport::default()
    };
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut exploded = Vec::new();

    for record in &table.records {
        let Some(entity_id) = plan.entity_id_of(record) else {
            report.unkeyed_records += 1;
            continue;
        };

        let categories = record.text(plan.category.index).unwrap_or_default();
        let mut emitted_any = false;
        for token in split_categories(categories, &plan.category_delimiter) {
            emitted_any = true;
            if !seen.insert((entity_id, token)) {
                report.duplicate_pairs_dropped += 1;
                continue;
            }
            exploded.push(ExplodedRecord {
                entity_id: entity_id.to_string(),
                category: token.to_string(),
            });
        }
        if !emitted_any {
            report.records_without_categories += 1;
        }
    }

    report.exploded_records = exploded.len();

    if report.unkeyed_records > 0 {
        warn!(
            count = report.unkeyed_records,
            field = %plan.entity_id.name,
            "Records without an id skipped during explosion"
        );
    }
    info!(
        pairs = report.exploded_records,
        duplicates = report.duplicate_pairs_dropped,
        empty = report.records_without_categories,
        "Category explosion completed"
    );

    (exploded, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::SchemaConfig;
    use crate::domain::record::{Cell, Record, RecordSchema};
    use anyhow::Result;

    fn plan(delimiter: &str) -> Result<TransformPlan> {
        let config = SchemaConfig {
            entity_id: "id".into(),
            category: "cats".into(),
            category_delimiter: delimiter.into(),
            required: vec![],
            dates: vec![],
            text: vec![],
            entity_columns: vec![],
        };
        Ok(config.resolve(&RecordSchema::new(vec!["id".into(), "cats".into()]))?)
    }

    fn table(rows: &[(Option<&str>, Option<&str>)]) -> RecordTable {
        RecordTable {
            schema: RecordSchema::new(vec!["id".into(), "cats".into()]),
            records: rows
                .iter()
                .map(|(id, cats)| {
                    Record::new(vec![
                        Cell::from(id.map(String::from)),
                        Cell::from(cats.map(String::from)),
                    ])
                })
                .collect(),
        }
    }

    fn pairs(exploded: &[ExplodedRecord]) -> Vec<(&str, &str)> {
        exploded
            .iter()
            .map(|e| (e.entity_id.as_str(), e.category.as_str()))
            .collect()
    }

    #[test]
    fn test_split_trims_and_drops_empty_tokens() {
        let tokens: Vec<&str> = split_categories(" Drama, ,Comedy ,", ",").collect();
        assert_eq!(tokens, vec!["Drama", "Comedy"]);
    }

    #[test]
    fn test_explosion_order_and_dedup() -> Result<()> {
        let input = table(&[
            (Some("1"), Some("Drama, Comedy, Drama")),
            (Some("2"), Some("Comedy")),
            (Some("1"), Some("Comedy, Thriller")),
        ]);
        let (out, report) = explode_categories(&input, &plan(",")?);

        assert_eq!(
            pairs(&out),
            vec![
                ("1", "Drama"),
                ("1", "Comedy"),
                ("2", "Comedy"),
                ("1", "Thriller"),
            ]
        );
        assert_eq!(report.duplicate_pairs_dropped, 2);
        assert_eq!(report.exploded_records, 4);
        Ok(())
    }

    #[test]
    fn test_empty_category_yields_no_pairs() -> Result<()> {
        let input = table(&[(Some("1"), None), (Some("2"), Some(" , ")), (Some("3"), Some("Kids"))]);
        let (out, report) = explode_categories(&input, &plan(",")?);

        assert_eq!(pairs(&out), vec![("3", "Kids")]);
        assert_eq!(report.records_without_categories, 2);
        Ok(())
    }

    #[test]
    fn test_unkeyed_records_are_counted() -> Result<()> {
        let input = table(&[(None, Some("Drama")), (Some("  "), Some("Drama")), (Some("1"), Some("Drama"))]);
        let (out, report) = explode_categories(&input, &plan(",")?);

        assert_eq!(out.len(), 1);
        assert_eq!(report.unkeyed_records, 2);
        Ok(())
    }

    #[test]
    fn test_custom_delimiter() -> Result<()> {
        let input = table(&[(Some("1"), Some("Action|Sci-Fi, Space"))]);
        let (out, _) = explode_categories(&input, &plan("|")?);
        assert_eq!(pairs(&out), vec![("1", "Action"), ("1", "Sci-Fi, Space")]);
        Ok(())
    }
}
