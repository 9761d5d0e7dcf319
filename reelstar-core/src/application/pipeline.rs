// reelstar-core/src/application/pipeline.rs

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument};

use crate::application::materialization::{LoadSummary, StarSchemaLoader};
use crate::application::validation::{ValidationReport, validate_load};
use crate::domain::project::PipelineConfig;
use crate::domain::transform::{DataQualityReport, TransformOutput, transform};
use crate::error::EtlError;
use crate::infrastructure::fs::write_run_artifact;
use crate::ports::connector::Connector;
use crate::ports::source::RecordSource;

pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub pipeline: String,
    pub source: String,
    pub engine: String,
    pub records_read: usize,
    pub quality: DataQualityReport,
    pub load: LoadSummary,
    pub validation: ValidationReport,
    pub elapsed_ms: u128,
    pub finished_at: String,
    /// Where this summary was written.
    #[serde(skip)]
    pub artifact: PathBuf,
}

/// Source records already checked against the schema contract and
/// transformed in memory. Nothing has touched the store yet.
#[derive(Debug)]
pub struct PreparedRun {
    pub source: String,
    pub records_read: usize,
    pub output: TransformOutput,
    started: Instant,
}

/// Extract, resolve the schema contract, transform. Every fatal input
/// problem surfaces here, before a connector is needed.
#[instrument(skip_all, fields(pipeline = %config.name))]
pub fn prepare_run<S>(source: &S, config: &PipelineConfig) -> Result<PreparedRun, EtlError>
where
    S: RecordSource + ?Sized,
{
    let started = Instant::now();

    // 1. EXTRACT
    let table = source.read_records()?;
    let records_read = table.len();
    info!(source = %source.describe(), records = records_read, "Extracted");

    // 2. SCHEMA CONTRACT (fatal before any transform)
    let plan = config.schema.resolve(&table.schema)?;

    // 3. TRANSFORM (pure, in memory)
    let output = transform(table, &plan);
    for warning in output.report.warnings() {
        info!(%warning, "Data quality");
    }

    Ok(PreparedRun {
        source: source.describe(),
        records_read,
        output,
        started,
    })
}

/// Load, validate, write the run summary. Any error before the commit leaves
/// the store untouched and writes no summary.
#[instrument(skip_all, fields(pipeline = %config.name))]
pub async fn load_run(
    run: PreparedRun,
    connector: &dyn Connector,
    config: &PipelineConfig,
    project_dir: &Path,
) -> Result<RunSummary, EtlError> {
    let PreparedRun {
        source,
        records_read,
        output,
        started,
    } = run;

    // 4. LOAD (single transaction)
    let loader = StarSchemaLoader::new(connector, &config.tables);
    let load = loader.persist(&output.schema).await?;

    // 5. POST-LOAD VALIDATION (warnings only)
    let validation = validate_load(connector, &config.tables, &output.schema).await?;

    let mut summary = RunSummary {
        pipeline: config.name.clone(),
        source,
        engine: connector.engine_name().to_string(),
        records_read,
        quality: output.report,
        load,
        validation,
        elapsed_ms: started.elapsed().as_millis(),
        finished_at: chrono::Utc::now().to_rfc3339(),
        artifact: PathBuf::new(),
    };

    // 6. RUN ARTIFACT
    summary.artifact =
        write_run_artifact(&config.target_dir(project_dir), RUN_SUMMARY_FILE, &summary)?;
    info!(
        path = ?summary.artifact,
        elapsed_ms = summary.elapsed_ms,
        "Pipeline finished"
    );

    Ok(summary)
}

/// Extract, transform, load, validate.
pub async fn run_pipeline<S>(
    source: &S,
    connector: &dyn Connector,
    config: &PipelineConfig,
    project_dir: &Path,
) -> Result<RunSummary, EtlError>
where
    S: RecordSource + ?Sized,
{
    let run = prepare_run(source, config)?;
    load_run(run, connector, config, project_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::project::IN_MEMORY_DATABASE;
    use crate::domain::record::{RawRecord, RawTable, RecordSchema};
    use crate::infrastructure::adapters::duckdb::DuckDBConnector;
    use anyhow::{Result, bail};
    use std::fs;
    use tempfile::tempdir;

    struct VecSource {
        header: Vec<&'static str>,
        rows: Vec<Vec<Option<&'static str>>>,
    }

    impl RecordSource for VecSource {
        fn read_records(&self) -> Result<RawTable, EtlError> {
            Ok(RawTable::new(
                RecordSchema::new(self.header.iter().map(|h| h.to_string()).collect()),
                self.rows
                    .iter()
                    .map(|r| RawRecord::new(r.iter().map(|v| v.map(String::from)).collect()))
                    .collect(),
            ))
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    fn catalog() -> VecSource {
        VecSource {
            header: vec![
                "show_id",
                "type",
                "title",
                "director",
                "country",
                "date_added",
                "release_year",
                "rating",
                "duration",
                "listed_in",
                "description",
            ],
            rows: vec![
                vec![
                    Some("s1"),
                    Some("Movie"),
                    Some("First"),
                    Some("A"),
                    Some("US"),
                    Some("September 25, 2021"),
                    Some("2020"),
                    Some("PG"),
                    Some("90 min"),
                    Some("Dramas, Comedies"),
                    Some("d1"),
                ],
                vec![
                    Some("s2"),
                    Some("TV Show"),
                    Some("Second"),
                    Some("B"),
                    Some("UK"),
                    Some("soon"),
                    Some("2019"),
                    Some("TV-MA"),
                    Some("2 Seasons"),
                    Some("Dramas"),
                    Some("d2"),
                ],
                vec![
                    Some("s3"),
                    Some("Movie"),
                    Some("Third"),
                    None,
                    Some("FR"),
                    Some("2021-01-01"),
                    Some("2018"),
                    Some("R"),
                    Some("100 min"),
                    Some("Thrillers"),
                    Some("d3"),
                ],
            ],
        }
    }

    fn in_memory_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.target.database = IN_MEMORY_DATABASE.to_string();
        config
    }

    #[tokio::test]
    async fn test_run_pipeline_end_to_end() -> Result<()> {
        let dir = tempdir()?;
        let connector = DuckDBConnector::new(IN_MEMORY_DATABASE)?;
        let config = in_memory_config();

        let summary = run_pipeline(&catalog(), &connector, &config, dir.path()).await?;

        assert_eq!(summary.records_read, 3);
        assert_eq!(summary.load.rows_for("dim_movies"), Some(2));
        assert_eq!(summary.load.rows_for("dim_genres"), Some(2));
        assert_eq!(summary.load.rows_for("movies_genres"), Some(3));
        assert_eq!(summary.quality.cleaning.records_dropped_missing, 1);
        assert_eq!(summary.quality.normalization.total_invalid_dates(), 1);
        assert!(summary.validation.is_clean());

        let nulls = connector
            .query_scalar("SELECT count(*) FROM dim_movies WHERE date_added IS NULL")
            .await?;
        assert_eq!(nulls, 1);

        let written = fs::read_to_string(dir.path().join("target").join(RUN_SUMMARY_FILE))?;
        let json: serde_json::Value = serde_json::from_str(&written)?;
        assert_eq!(json["records_read"], 3);
        assert_eq!(json["load"]["tables"][0]["table"], "dim_genres");
        Ok(())
    }

    #[tokio::test]
    async fn test_schema_violation_stops_before_load() -> Result<()> {
        let dir = tempdir()?;
        let connector = DuckDBConnector::new(IN_MEMORY_DATABASE)?;
        let mut source = catalog();
        source.header[3] = "directors";

        match run_pipeline(&source, &connector, &in_memory_config(), dir.path()).await {
            Err(EtlError::Domain(DomainError::SchemaViolation { missing, .. })) => {
                assert_eq!(missing, vec!["director"]);
            }
            other => bail!("Expected SchemaViolation, got {:?}", other.map(|s| s.records_read)),
        }
        // Nothing loaded, nothing written
        assert!(connector.query_scalar("SELECT count(*) FROM dim_movies").await.is_err());
        assert!(!dir.path().join("target").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_rerun_replaces_previous_load() -> Result<()> {
        let dir = tempdir()?;
        let connector = DuckDBConnector::new(IN_MEMORY_DATABASE)?;
        let config = in_memory_config();

        run_pipeline(&catalog(), &connector, &config, dir.path()).await?;
        let mut smaller = catalog();
        smaller.rows.truncate(1);
        let summary = run_pipeline(&smaller, &connector, &config, dir.path()).await?;

        assert_eq!(summary.load.rows_for("dim_movies"), Some(1));
        assert_eq!(connector.query_scalar("SELECT count(*) FROM dim_movies").await?, 1);
        Ok(())
    }

    #[test]
    fn test_prepare_run_needs_no_store() -> Result<()> {
        let run = prepare_run(&catalog(), &in_memory_config())?;
        assert_eq!(run.source, "memory");
        assert_eq!(run.records_read, 3);
        assert_eq!(run.output.schema.entities.len(), 2);
        assert_eq!(run.output.report.cleaning.records_dropped_missing, 1);

        let mut broken = catalog();
        broken.header[9] = "genres";
        assert!(matches!(
            prepare_run(&broken, &in_memory_config()),
            Err(EtlError::Domain(DomainError::SchemaViolation { .. }))
        ));
        Ok(())
    }
}
