// reelstar/src/commands/validate.rs
//
// USE CASE: Re-run the integrity assertions against a loaded database.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};

use reelstar_core::EtlError;
use reelstar_core::application::audit_tables;
use reelstar_core::infrastructure::adapters::duckdb::DuckDBConnector;

use crate::cli::ProjectArgs;
use crate::commands::{exit_with, load_config};

pub async fn execute(project: ProjectArgs) -> anyhow::Result<()> {
    let config = load_config(&project, None)
        .unwrap_or_else(|e| exit_with("CONFIGURATION ERROR", &e));
    let db_path = config.database_path(&project.project_dir);

    let connector = DuckDBConnector::open_existing(&db_path)
        .map_err(EtlError::from)
        .unwrap_or_else(|e| exit_with("DATABASE NOT FOUND (have you run 'reelstar run'?)", &e));

    println!("🧪 Validating {db_path}...");
    let checks = audit_tables(&connector, &config.tables)
        .await
        .unwrap_or_else(|e| exit_with("VALIDATION FAILED", &e));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Table", "Check", "Violations", "Status"]);
    for check in &checks {
        let status = if check.passed() {
            Cell::new("PASS").fg(Color::Green)
        } else {
            Cell::new("FAIL").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&check.table),
            Cell::new(&check.name),
            Cell::new(check.violations),
            status,
        ]);
    }
    println!("{table}");

    let failed = checks.iter().filter(|c| !c.passed()).count();
    if failed > 0 {
        eprintln!("\n❌ FAILURE. {failed} integrity check(s) failed.");
        std::process::exit(1);
    }
    println!("\n✨ All {} checks passed.", checks.len());
    Ok(())
}
