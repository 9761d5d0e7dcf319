// reelstar-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::domain::project::PipelineConfig;
use crate::error::EtlError;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_CANDIDATES: [&str; 2] = ["reelstar.yaml", "reelstar_project.yaml"];

pub const ENV_SOURCE_PATH: &str = "REELSTAR_SOURCE_PATH";
pub const ENV_DATABASE_PATH: &str = "REELSTAR_DATABASE_PATH";
pub const ENV_TARGET_PATH: &str = "REELSTAR_TARGET_PATH";

/// Values given on the command line. They win over the project file and the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Explicit project file; it must exist.
    pub config_file: Option<PathBuf>,
    pub source: Option<String>,
    pub database: Option<String>,
}

/// Layering: defaults, then the project file, then `REELSTAR_*` variables,
/// then command line flags. The result is validated before it is returned.
#[instrument(skip(overrides))]
pub fn load_pipeline_config(
    project_dir: &Path,
    overrides: &ConfigOverrides,
) -> Result<PipelineConfig, EtlError> {
    load_with_env(project_dir, overrides, |key| std::env::var(key).ok())
}

pub fn load_with_env<F>(
    project_dir: &Path,
    overrides: &ConfigOverrides,
    lookup: F,
) -> Result<PipelineConfig, EtlError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match find_config_file(project_dir, overrides.config_file.as_deref())? {
        Some(path) => {
            info!(path = ?path, "Loading project configuration");
            read_config(&path)?
        }
        None => {
            info!(dir = ?project_dir, "No project file found, using built-in defaults");
            PipelineConfig::default()
        }
    };

    apply_env_overrides(&mut config, lookup);
    apply_cli_overrides(&mut config, overrides);

    config.check()?;
    debug!(?config, "Configuration resolved");
    Ok(config)
}

fn find_config_file(
    project_dir: &Path,
    explicit: Option<&Path>,
) -> Result<Option<PathBuf>, InfrastructureError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(Some(path.to_path_buf()))
        } else {
            Err(InfrastructureError::ConfigNotFound(path.display().to_string()))
        };
    }
    Ok(CONFIG_CANDIDATES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|p| p.is_file()))
}

fn read_config(path: &Path) -> Result<PipelineConfig, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    // An empty file deserializes to unit, not to a mapping
    if content.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

fn apply_env_overrides<F>(config: &mut PipelineConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_SOURCE_PATH) {
        info!(old = ?config.source.path, new = ?val, "Overriding source path via ENV");
        config.source.path = val;
    }
    if let Some(val) = lookup(ENV_DATABASE_PATH) {
        info!(old = ?config.target.database, new = ?val, "Overriding database via ENV");
        config.target.database = val;
    }
    if let Some(val) = lookup(ENV_TARGET_PATH) {
        info!(old = ?config.target.path, new = ?val, "Overriding target path via ENV");
        config.target.path = val;
    }
}

fn apply_cli_overrides(config: &mut PipelineConfig, overrides: &ConfigOverrides) {
    if let Some(source) = &overrides.source {
        config.source.path = source.clone();
    }
    if let Some(database) = &overrides.database {
        config.target.database = database.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use anyhow::Result;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_project_file() -> Result<()> {
        let dir = tempdir()?;
        let config = load_with_env(dir.path(), &ConfigOverrides::default(), no_env)?;
        assert_eq!(config.name, "netflix");
        assert_eq!(config.schema.entity_id, "show_id");
        Ok(())
    }

    #[test]
    fn test_project_file_is_discovered() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("reelstar_project.yaml"),
            "name: anime\nsource:\n  path: anime.csv\n",
        )?;
        let config = load_with_env(dir.path(), &ConfigOverrides::default(), no_env)?;
        assert_eq!(config.name, "anime");
        assert_eq!(config.source.path, "anime.csv");
        Ok(())
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let overrides = ConfigOverrides {
            config_file: Some(dir.path().join("absent.yaml")),
            ..ConfigOverrides::default()
        };
        let result = load_with_env(dir.path(), &overrides, no_env);
        assert!(matches!(
            result,
            Err(EtlError::Infrastructure(InfrastructureError::ConfigNotFound(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_layering_order() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("reelstar.yaml"),
            "source:\n  path: from_file.csv\ntarget:\n  database: file.duckdb\n",
        )?;
        let env: HashMap<&str, &str> = [
            (ENV_SOURCE_PATH, "from_env.csv"),
            (ENV_DATABASE_PATH, "env.duckdb"),
            (ENV_TARGET_PATH, "out"),
        ]
        .into_iter()
        .collect();
        let overrides = ConfigOverrides {
            database: Some(":memory:".into()),
            ..ConfigOverrides::default()
        };

        let config = load_with_env(dir.path(), &overrides, |k| {
            env.get(k).map(|v| v.to_string())
        })?;
        assert_eq!(config.source.path, "from_env.csv");
        assert_eq!(config.target.database, ":memory:");
        assert_eq!(config.target.path, "out");
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("reelstar.yaml"),
            "schema:\n  entity_id: listed_in\n",
        )?;
        let result = load_with_env(dir.path(), &ConfigOverrides::default(), no_env);
        assert!(matches!(
            result,
            Err(EtlError::Domain(DomainError::InvalidConfiguration(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_broken_yaml_is_reported() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("reelstar.yaml"), "name: [unclosed\n")?;
        let result = load_with_env(dir.path(), &ConfigOverrides::default(), no_env);
        assert!(matches!(
            result,
            Err(EtlError::Infrastructure(InfrastructureError::YamlError(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_empty_file_means_defaults() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("reelstar.yaml"), "\n")?;
        let config = load_with_env(dir.path(), &ConfigOverrides::default(), no_env)?;
        assert_eq!(config.tables.entities.name, "dim_movies");
        Ok(())
    }
}
