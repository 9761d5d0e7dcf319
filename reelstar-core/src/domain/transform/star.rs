// reelstar-core/src/domain/transform/star.rs

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

use crate::domain::project::TransformPlan;
use crate::domain::record::{Cell, ExplodedRecord, RecordTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Text,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityColumn {
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRow {
    pub entity_key: i64,
    /// Aligned with [`StarSchema::entity_columns`].
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub category_key: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JunctionRow {
    pub entity_key: i64,
    pub category_key: i64,
}

/// The three related tables of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarSchema {
    pub entity_columns: Vec<EntityColumn>,
    pub entities: Vec<EntityRow>,
    pub categories: Vec<CategoryRow>,
    pub junction: Vec<JunctionRow>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BuildReport {
    pub entities: usize,
    pub categories: usize,
    pub associations: usize,
    /// Later records reusing an id already seen. The first one wins.
    pub duplicate_entity_ids: usize,
    pub unkeyed_records: usize,
    pub unresolved_associations: usize,
}

/// Assigns surrogate keys in first-appearance order, both dense from 1, and
/// resolves every exploded pair into a junction row.
#[instrument(skip_all, fields(records = table.records.len(), pairs = exploded.len()))]
pub fn build_star_schema(
    table: &RecordTable,
    exploded: &[ExplodedRecord],
    plan: &TransformPlan,
) -> (StarSchema, BuildReport) {
    let mut report = BuildReport::default();

    // 1. Category dimension
    let mut category_keys: HashMap<&str, i64> = HashMap::new();
    let mut categories = Vec::new();
    for pair in exploded {
        if !category_keys.contains_key(pair.category.as_str()) {
            let key = next_key(categories.len());
            category_keys.insert(pair.category.as_str(), key);
            categories.push(CategoryRow {
                category_key: key,
                name: pair.category.clone(),
            });
        }
    }

    // 2. Entity dimension
    let entity_columns: Vec<EntityColumn> = plan
        .entity_columns
        .iter()
        .map(|f| EntityColumn {
            name: f.name.clone(),
            kind: if plan.is_date_field(f.index) {
                ColumnKind::Date
            } else {
                ColumnKind::Text
            },
        })
        .collect();

    let mut entity_keys: HashMap<&str, i64> = HashMap::new();
    let mut entities = Vec::new();
    for record in &table.records {
        let Some(entity_id) = plan.entity_id_of(record) else {
            report.unkeyed_records += 1;
            continue;
        };
        if entity_keys.contains_key(entity_id) {
            report.duplicate_entity_ids += 1;
            continue;
        }
        let key = next_key(entities.len());
        entity_keys.insert(entity_id, key);
        entities.push(EntityRow {
            entity_key: key,
            cells: plan
                .entity_columns
                .iter()
                .map(|f| record.cell(f.index).cloned().unwrap_or(Cell::Null))
                .collect(),
        });
    }

    // 3. Junction
    let mut seen: HashSet<JunctionRow> = HashSet::new();
    let mut junction = Vec::new();
    for pair in exploded {
        let resolved = entity_keys
            .get(pair.entity_id.as_str())
            .zip(category_keys.get(pair.category.as_str()));
        let Some((&entity_key, &category_key)) = resolved else {
            report.unresolved_associations += 1;
            continue;
        };
        let row = JunctionRow {
            entity_key,
            category_key,
        };
        if seen.insert(row) {
            junction.push(row);
        }
    }

    report.entities = entities.len();
    report.categories = categories.len();
    report.associations = junction.len();

    if report.duplicate_entity_ids > 0 {
        warn!(
            count = report.duplicate_entity_ids,
            "Conflicting records share an id; first occurrence kept"
        );
    }
    if report.unresolved_associations > 0 {
        warn!(
            count = report.unresolved_associations,
            "Associations dropped for unresolved keys"
        );
    }
    info!(
        entities = report.entities,
        categories = report.categories,
        associations = report.associations,
        "Star schema built"
    );

    (
        StarSchema {
            entity_columns,
            entities,
            categories,
            junction,
        },
        report,
    )
}

fn next_key(len: usize) -> i64 {
    i64::try_from(len).map_or(i64::MAX, |n| n + 1)
}
