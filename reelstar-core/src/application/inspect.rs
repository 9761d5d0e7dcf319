// reelstar-core/src/application/inspect.rs

use std::time::Instant;
use tracing::{debug, instrument};

use crate::application::validation::count_rows;
use crate::domain::project::TableLayout;
use crate::error::EtlError;
use crate::ports::connector::{ColumnSchema, Connector};

/// Column schema, size and a few rows of one stored table.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub table: String,
    pub columns: Vec<ColumnSchema>,
    pub row_count: u64,
    pub sample: Vec<Vec<String>>,
}

#[instrument(skip(connector))]
pub async fn inspect_table(
    connector: &dyn Connector,
    table: &str,
    limit: usize,
) -> Result<TableSnapshot, EtlError> {
    let start = Instant::now();

    let columns = connector.fetch_columns(table).await?;
    if columns.is_empty() {
        return Err(EtlError::InternalError(format!(
            "Table '{table}' does not exist in this database"
        )));
    }
    let row_count = count_rows(connector, table).await?;
    let sample = connector.sample_rows(table, limit).await?;

    debug!("Inspected {} in {:.2?}", table, start.elapsed());
    Ok(TableSnapshot {
        table: table.to_string(),
        columns,
        row_count,
        sample,
    })
}

/// Snapshots of the three layout tables, or of `only` when given.
pub async fn inspect_layout(
    connector: &dyn Connector,
    layout: &TableLayout,
    only: Option<&str>,
    limit: usize,
) -> Result<Vec<TableSnapshot>, EtlError> {
    let tables: Vec<&str> = match only {
        Some(table) => vec![table],
        None => layout.load_order().to_vec(),
    };

    let mut snapshots = Vec::with_capacity(tables.len());
    for table in tables {
        snapshots.push(inspect_table(connector, table, limit).await?);
    }
    Ok(snapshots)
}
