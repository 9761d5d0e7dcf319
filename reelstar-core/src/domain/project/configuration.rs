// reelstar-core/src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

use crate::domain::error::DomainError;

pub const IN_MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_key_collisions"))]
pub struct PipelineConfig {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(nested)]
    pub source: SourceConfig,

    #[validate(nested)]
    pub target: TargetConfig,

    #[validate(nested)]
    pub schema: SchemaConfig,

    #[validate(nested)]
    pub tables: TableLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "netflix".to_string(),
            source: SourceConfig::default(),
            target: TargetConfig::default(),
            schema: SchemaConfig::default(),
            tables: TableLayout::default(),
        }
    }
}

impl PipelineConfig {
    /// Runs every validation rule and flattens the result into a single error.
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::InvalidConfiguration(e.to_string()))
    }

    pub fn source_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.source.path)
    }

    pub fn target_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.target.path)
    }

    /// `:memory:` is passed through untouched.
    pub fn database_path(&self, project_dir: &Path) -> String {
        if self.target.database == IN_MEMORY_DATABASE {
            return IN_MEMORY_DATABASE.to_string();
        }
        project_dir
            .join(&self.target.database)
            .to_string_lossy()
            .into_owned()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct SourceConfig {
    #[validate(length(min = 1))]
    pub path: String,

    #[validate(custom(function = "validate_ascii_delimiter"))]
    pub delimiter: char,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: "data/netflix_titles.csv".to_string(),
            delimiter: ',',
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct TargetConfig {
    /// DuckDB file, relative to the project directory, or `:memory:`.
    #[validate(length(min = 1))]
    pub database: String,

    /// Directory receiving `run_summary.json`.
    #[validate(length(min = 1))]
    pub path: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            database: "target/reelstar.duckdb".to_string(),
            path: "target".to_string(),
        }
    }
}

/// Which source fields play which role in the transform.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_field_roles"))]
pub struct SchemaConfig {
    #[validate(length(min = 1))]
    pub entity_id: String,

    #[validate(length(min = 1))]
    pub category: String,

    #[validate(length(min = 1, message = "category delimiter cannot be empty"))]
    pub category_delimiter: String,

    pub required: Vec<String>,
    pub dates: Vec<String>,
    pub text: Vec<String>,

    /// Descriptive columns carried into the entity dimension. Empty means
    /// every source field except the id and the category.
    pub entity_columns: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            entity_id: "show_id".to_string(),
            category: "listed_in".to_string(),
            category_delimiter: ",".to_string(),
            required: strings(&["director", "country", "date_added", "rating"]),
            dates: strings(&["date_added"]),
            text: strings(&["director", "country", "listed_in", "title"]),
            entity_columns: strings(&[
                "title",
                "type",
                "director",
                "country",
                "date_added",
                "release_year",
                "rating",
                "duration",
                "description",
            ]),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_distinct_tables"))]
pub struct TableLayout {
    #[validate(nested)]
    pub entities: EntityTable,
    #[validate(nested)]
    pub categories: CategoryTable,
    #[validate(nested)]
    pub junction: JunctionTable,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            entities: EntityTable {
                name: "dim_movies".to_string(),
                key: "movie_id".to_string(),
            },
            categories: CategoryTable {
                name: "dim_genres".to_string(),
                key: "genre_id".to_string(),
                label: "genre_name".to_string(),
            },
            junction: JunctionTable {
                name: "movies_genres".to_string(),
            },
        }
    }
}

impl TableLayout {
    /// Table names in load order: categories, entities, junction.
    pub fn load_order(&self) -> [&str; 3] {
        [
            self.categories.name.as_str(),
            self.entities.name.as_str(),
            self.junction.name.as_str(),
        ]
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct EntityTable {
    #[validate(custom(function = "validate_sql_identifier"))]
    pub name: String,
    #[validate(custom(function = "validate_sql_identifier"))]
    pub key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct CategoryTable {
    #[validate(custom(function = "validate_sql_identifier"))]
    pub name: String,
    #[validate(custom(function = "validate_sql_identifier"))]
    pub key: String,
    #[validate(custom(function = "validate_sql_identifier"))]
    pub label: String,
}

/// Columns reuse the two dimension key names.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct JunctionTable {
    #[validate(custom(function = "validate_sql_identifier"))]
    pub name: String,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// --- VALIDATION RULES ---

fn validate_ascii_delimiter(delimiter: &char) -> Result<(), ValidationError> {
    if delimiter.is_ascii() && !delimiter.is_ascii_alphanumeric() {
        Ok(())
    } else {
        Err(ValidationError::new("delimiter_not_ascii_punctuation"))
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn validate_sql_identifier(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ValidationError::new("not_a_sql_identifier"))
    }
}

fn validate_field_roles(schema: &SchemaConfig) -> Result<(), ValidationError> {
    if schema.entity_id == schema.category {
        return Err(ValidationError::new("id_and_category_share_a_field"));
    }
    let key_fields = [&schema.entity_id, &schema.category];
    if schema.dates.iter().any(|d| key_fields.contains(&d)) {
        return Err(ValidationError::new("id_or_category_declared_as_date"));
    }
    if schema.entity_columns.iter().any(|c| key_fields.contains(&c)) {
        return Err(ValidationError::new("id_or_category_in_entity_columns"));
    }
    let mut seen = HashSet::new();
    if !schema.entity_columns.iter().all(|c| seen.insert(c)) {
        return Err(ValidationError::new("duplicate_entity_column"));
    }
    Ok(())
}

fn validate_key_collisions(config: &PipelineConfig) -> Result<(), ValidationError> {
    let key = &config.tables.entities.key;
    if config.schema.entity_columns.iter().any(|c| c == key) {
        return Err(ValidationError::new("entity_column_shadows_surrogate_key"));
    }
    Ok(())
}

fn validate_distinct_tables(layout: &TableLayout) -> Result<(), ValidationError> {
    let names: HashSet<&str> = layout.load_order().into_iter().collect();
    if names.len() != 3 {
        return Err(ValidationError::new("table_names_must_be_distinct"));
    }
    if layout.entities.key == layout.categories.key {
        return Err(ValidationError::new("key_columns_must_be_distinct"));
    }
    if layout.categories.key == layout.categories.label {
        return Err(ValidationError::new("category_key_and_label_must_differ"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.check().is_ok());
        assert_eq!(config.tables.load_order(), ["dim_genres", "dim_movies", "movies_genres"]);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() -> Result<()> {
        let yaml = r#"
name: anime
schema:
  entity_id: anime_id
  category: genres
  category_delimiter: "|"
  required: [studio]
tables:
  junction:
    name: anime_genres
"#;
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        assert_eq!(config.name, "anime");
        assert_eq!(config.schema.entity_id, "anime_id");
        assert_eq!(config.schema.category_delimiter, "|");
        // Untouched sections fall back to defaults
        assert_eq!(config.schema.dates, vec!["date_added".to_string()]);
        assert_eq!(config.tables.entities.name, "dim_movies");
        assert_eq!(config.tables.junction.name, "anime_genres");
        assert_eq!(config.source.delimiter, ',');
        Ok(())
    }

    #[test]
    fn test_duplicate_table_names_rejected() {
        let mut config = PipelineConfig::default();
        config.tables.junction.name = "dim_movies".to_string();
        let err = config.check();
        assert!(matches!(err, Err(DomainError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_table_names_must_be_identifiers() {
        let mut config = PipelineConfig::default();
        config.tables.entities.name = "dim movies".to_string();
        assert!(config.check().is_err());

        config.tables.entities.name = "1movies".to_string();
        assert!(config.check().is_err());

        config.tables.entities.name = "_movies_2".to_string();
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_entity_column_clashing_with_key_rejected() {
        let mut config = PipelineConfig::default();
        config.schema.entity_columns.push("movie_id".to_string());
        assert!(config.check().is_err());
    }

    #[test]
    fn test_id_as_date_rejected() {
        let mut config = PipelineConfig::default();
        config.schema.dates.push("show_id".to_string());
        assert!(config.check().is_err());
    }

    #[test]
    fn test_empty_category_delimiter_rejected() {
        let mut config = PipelineConfig::default();
        config.schema.category_delimiter.clear();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_alphanumeric_source_delimiter_rejected() {
        let mut config = PipelineConfig::default();
        config.source.delimiter = 'x';
        assert!(config.check().is_err());
    }

    #[test]
    fn test_paths_resolve_against_project_dir() {
        let mut config = PipelineConfig::default();
        let root = Path::new("/srv/catalog");
        assert_eq!(
            config.source_path(root),
            PathBuf::from("/srv/catalog/data/netflix_titles.csv")
        );
        assert_eq!(config.target_dir(root), PathBuf::from("/srv/catalog/target"));

        config.target.database = IN_MEMORY_DATABASE.to_string();
        assert_eq!(config.database_path(root), ":memory:");
    }
}
