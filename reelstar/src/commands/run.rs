// reelstar/src/commands/run.rs
//
// USE CASE: Run the pipeline end to end.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use std::time::Instant;

use reelstar_core::EtlError;
use reelstar_core::application::{RunSummary, load_run, prepare_run};
use reelstar_core::infrastructure::adapters::csv::CsvRecordSource;
use reelstar_core::infrastructure::adapters::duckdb::DuckDBConnector;

use crate::cli::ProjectArgs;
use crate::commands::{display_path, exit_with, load_config};

pub async fn execute(project: ProjectArgs, source: Option<String>) -> anyhow::Result<()> {
    let start = Instant::now();

    // A. Load the Config (defaults < file < env < flags)
    println!("⚙️  Loading configuration...");
    let config = load_config(&project, source.as_deref())
        .unwrap_or_else(|e| exit_with("CONFIGURATION ERROR", &e));
    println!("   Pipeline: {}", config.name);

    // B. Extract and transform (the store is not opened until this succeeds)
    let source_path = config.source_path(&project.project_dir);
    let db_path = config.database_path(&project.project_dir);
    println!("   Source:   {}", display_path(&source_path));

    let record_source = CsvRecordSource::new(source_path).with_delimiter(config.source.delimiter);
    println!("🟢 Processing records...");
    let prepared = prepare_run(&record_source, &config)
        .unwrap_or_else(|e| exit_with("PIPELINE ABORTED (nothing was loaded)", &e));

    // C. Load into DuckDB (Application Layer)
    println!("   Database: {} 🦆", db_path);
    let connector = DuckDBConnector::new(&db_path)
        .map_err(EtlError::from)
        .unwrap_or_else(|e| exit_with("PIPELINE FAILED", &e));

    match load_run(prepared, &connector, &config, &project.project_dir).await {
        Ok(summary) => {
            print_summary(&summary);
            println!("\n✨ SUCCESS! Pipeline finished in {:.2?}", start.elapsed());
            Ok(())
        }
        Err(e) => exit_with("PIPELINE FAILED", &e),
    }
}

fn print_summary(summary: &RunSummary) {
    let mut tables = Table::new();
    tables.load_preset(UTF8_FULL).set_header(vec!["Table", "Rows"]);
    for load in &summary.load.tables {
        tables.add_row(vec![
            Cell::new(&load.table),
            Cell::new(load.rows).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("\n📦 Loaded tables");
    println!("{tables}");

    let q = &summary.quality;
    let counts = [
        ("records read", summary.records_read),
        ("dropped: missing required value", q.cleaning.records_dropped_missing),
        ("dropped: exact duplicate", q.cleaning.duplicates_dropped),
        ("invalid dates (loaded as NULL)", q.normalization.total_invalid_dates()),
        ("records without id", q.build.unkeyed_records),
        ("conflicting duplicate ids", q.build.duplicate_entity_ids),
        ("unresolved associations", q.build.unresolved_associations),
    ];
    let mut quality = Table::new();
    quality.load_preset(UTF8_FULL).set_header(vec!["Data quality", "Count"]);
    for (label, count) in counts {
        quality.add_row(vec![
            Cell::new(label),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("\n🧪 Data quality");
    println!("{quality}");

    for warning in q.warnings() {
        println!("   ⚠️  {warning}");
    }
    for warning in &summary.validation.warnings {
        println!("   ⚠️  [Validation] {warning}");
    }
    println!("📝 Run summary: {}", display_path(&summary.artifact));
}
