// reelstar-core/src/application/mod.rs

pub mod inspect;
pub mod materialization;
pub mod pipeline;
pub mod validation;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The CLI imports use cases from here without knowing the file layout.

pub use inspect::{TableSnapshot, inspect_layout, inspect_table};
pub use materialization::{LoadSummary, StarSchemaLoader, TableLoad};
pub use pipeline::{PreparedRun, RUN_SUMMARY_FILE, RunSummary, load_run, prepare_run, run_pipeline};
pub use validation::{IntegrityCheck, ValidationReport, audit_tables, validate_load};
