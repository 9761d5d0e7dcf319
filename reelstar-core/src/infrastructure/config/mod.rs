// reelstar-core/src/infrastructure/config/mod.rs

pub mod project;

pub use project::{
    CONFIG_CANDIDATES, ConfigOverrides, ENV_DATABASE_PATH, ENV_SOURCE_PATH, ENV_TARGET_PATH,
    load_pipeline_config,
};
