// reelstar-core/src/domain/project/mod.rs

pub mod configuration;
pub mod contract;

pub use configuration::{
    CategoryTable, EntityTable, IN_MEMORY_DATABASE, JunctionTable, PipelineConfig, SchemaConfig,
    SourceConfig, TableLayout, TargetConfig,
};
pub use contract::{FieldRef, TransformPlan};
