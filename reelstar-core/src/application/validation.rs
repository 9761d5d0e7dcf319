// reelstar-core/src/application/validation.rs

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{instrument, warn};

use crate::domain::project::TableLayout;
use crate::domain::sql::quote_ident;
use crate::domain::transform::StarSchema;
use crate::error::EtlError;
use crate::ports::connector::Connector;

/// Outcome of one SQL assertion; `violations` counts offending rows.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IntegrityCheck {
    pub name: String,
    pub table: String,
    pub violations: u64,
}

impl IntegrityCheck {
    pub fn passed(&self) -> bool {
        self.violations == 0
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub row_counts: BTreeMap<String, u64>,
    pub checks: Vec<IntegrityCheck>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Post-load check of a run: stored row counts against the in-memory
/// tables, then the integrity assertions. Findings are warnings only.
#[instrument(skip_all)]
pub async fn validate_load(
    connector: &dyn Connector,
    layout: &TableLayout,
    star: &StarSchema,
) -> Result<ValidationReport, EtlError> {
    let expected = [
        (&layout.categories.name, star.categories.len()),
        (&layout.entities.name, star.entities.len()),
        (&layout.junction.name, star.junction.len()),
    ];

    let mut report = ValidationReport::default();
    for (table, in_memory) in expected {
        let stored = count_rows(connector, table).await?;
        if stored != in_memory as u64 {
            let msg = format!("{table}: {stored} row(s) stored, {in_memory} expected");
            warn!(table = %table, stored, expected = in_memory, "Row count mismatch");
            report.warnings.push(msg);
        }
        report.row_counts.insert(table.clone(), stored);
    }

    let checks = audit_tables(connector, layout).await?;
    report.warnings.extend(failed_check_warnings(&checks));
    report.checks = checks;
    Ok(report)
}

/// Integrity assertions that need nothing but the stored tables.
#[instrument(skip_all)]
pub async fn audit_tables(
    connector: &dyn Connector,
    layout: &TableLayout,
) -> Result<Vec<IntegrityCheck>, EtlError> {
    let entities = quote_ident(&layout.entities.name);
    let entity_key = quote_ident(&layout.entities.key);
    let categories = quote_ident(&layout.categories.name);
    let category_key = quote_ident(&layout.categories.key);
    let junction = quote_ident(&layout.junction.name);

    let assertions = [
        (
            "unique keys",
            &layout.categories.name,
            format!("SELECT count(*) - count(DISTINCT {category_key}) FROM {categories}"),
        ),
        (
            "dense keys",
            &layout.categories.name,
            dense_keys_sql(&categories, &category_key),
        ),
        (
            "unique keys",
            &layout.entities.name,
            format!("SELECT count(*) - count(DISTINCT {entity_key}) FROM {entities}"),
        ),
        (
            "dense keys",
            &layout.entities.name,
            dense_keys_sql(&entities, &entity_key),
        ),
        (
            "orphan entity keys",
            &layout.junction.name,
            orphans_sql(&junction, &entities, &entity_key),
        ),
        (
            "orphan category keys",
            &layout.junction.name,
            orphans_sql(&junction, &categories, &category_key),
        ),
        (
            "duplicate associations",
            &layout.junction.name,
            format!(
                "SELECT count(*) FROM (SELECT {entity_key}, {category_key} FROM {junction} \
                 GROUP BY {entity_key}, {category_key} HAVING count(*) > 1)"
            ),
        ),
    ];

    let mut checks = Vec::with_capacity(assertions.len());
    for (name, table, sql) in assertions {
        let violations = connector.query_scalar(&sql).await?;
        checks.push(IntegrityCheck {
            name: name.to_string(),
            table: table.clone(),
            violations,
        });
    }
    Ok(checks)
}

pub fn failed_check_warnings(checks: &[IntegrityCheck]) -> Vec<String> {
    checks
        .iter()
        .filter(|c| !c.passed())
        .map(|c| {
            warn!(table = %c.table, check = %c.name, violations = c.violations, "Integrity check failed");
            format!("{}: {} failed ({} row(s))", c.table, c.name, c.violations)
        })
        .collect()
}

pub async fn count_rows(connector: &dyn Connector, table: &str) -> Result<u64, EtlError> {
    connector
        .query_scalar(&format!("SELECT count(*) FROM {}", quote_ident(table)))
        .await
}

// Keys outside 1..=count(*). Together with uniqueness this means exactly 1..N.
fn dense_keys_sql(table: &str, key: &str) -> String {
    format!(
        "SELECT count(*) FROM {table} WHERE {key} IS NULL OR {key} < 1 \
         OR {key} > (SELECT count(*) FROM {table})"
    )
}

fn orphans_sql(junction: &str, dimension: &str, key: &str) -> String {
    format!(
        "SELECT count(*) FROM {junction} j LEFT JOIN {dimension} d ON j.{key} = d.{key} \
         WHERE d.{key} IS NULL"
    )
}
