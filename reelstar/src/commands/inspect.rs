// reelstar/src/commands/inspect.rs
//
// USE CASE: Inspect loaded tables (schema + sample rows).

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

use reelstar_core::EtlError;
use reelstar_core::application::{TableSnapshot, inspect_layout};
use reelstar_core::infrastructure::adapters::duckdb::DuckDBConnector;

use crate::cli::ProjectArgs;
use crate::commands::{exit_with, load_config};

pub async fn execute(project: ProjectArgs, table: Option<String>, limit: usize) -> anyhow::Result<()> {
    let config = load_config(&project, None)
        .unwrap_or_else(|e| exit_with("CONFIGURATION ERROR", &e));
    let db_path = config.database_path(&project.project_dir);

    let connector = DuckDBConnector::open_existing(&db_path)
        .map_err(EtlError::from)
        .unwrap_or_else(|e| exit_with("DATABASE NOT FOUND (have you run 'reelstar run'?)", &e));

    let snapshots = inspect_layout(&connector, &config.tables, table.as_deref(), limit)
        .await
        .unwrap_or_else(|e| exit_with("INSPECTION FAILED", &e));

    for snapshot in &snapshots {
        print_snapshot(snapshot, limit);
    }
    Ok(())
}

fn print_snapshot(snapshot: &TableSnapshot, limit: usize) {
    println!(
        "\n🔍 Table '{}' ({} row(s))",
        snapshot.table, snapshot.row_count
    );

    let mut schema = Table::new();
    schema
        .load_preset(UTF8_FULL)
        .set_header(vec!["Column", "Type", "Nullable"]);
    for column in &snapshot.columns {
        schema.add_row(vec![
            column.name.clone(),
            column.data_type.clone(),
            if column.is_nullable { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("{schema}");

    println!("   --- Rows (Limit {limit}) ---");
    let mut rows = Table::new();
    rows.load_preset(UTF8_FULL)
        .set_header(snapshot.columns.iter().map(|c| c.name.clone()));
    for row in &snapshot.sample {
        rows.add_row(row.clone());
    }
    println!("{rows}");
}
