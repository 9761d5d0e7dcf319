// reelstar-core/src/application/materialization.rs

use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::project::TableLayout;
use crate::domain::record::Cell;
use crate::domain::transform::{ColumnKind, StarSchema};
use crate::error::EtlError;
use crate::ports::connector::{ColumnDef, Connector, SqlType, SqlValue, TableBatch};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TableLoad {
    pub table: String,
    pub rows: u64,
}

/// Row counts reported by the store after a committed load, in load order.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct LoadSummary {
    pub tables: Vec<TableLoad>,
}

impl LoadSummary {
    pub fn rows_for(&self, table: &str) -> Option<u64> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }
}

/// Writes a [`StarSchema`] through a [`Connector`] with full-replace
/// semantics: category dimension, entity dimension, then the junction.
pub struct StarSchemaLoader<'a> {
    connector: &'a dyn Connector,
    layout: &'a TableLayout,
}

impl<'a> StarSchemaLoader<'a> {
    pub fn new(connector: &'a dyn Connector, layout: &'a TableLayout) -> Self {
        Self { connector, layout }
    }

    /// The three tables, ready for the store, in load order.
    pub fn batches(&self, star: &StarSchema) -> [TableBatch; 3] {
        let layout = self.layout;

        let categories = TableBatch {
            name: layout.categories.name.clone(),
            columns: vec![
                ColumnDef::new(&layout.categories.key, SqlType::BigInt).primary_key(),
                ColumnDef::new(&layout.categories.label, SqlType::Varchar),
            ],
            rows: star
                .categories
                .iter()
                .map(|c| vec![SqlValue::Integer(c.category_key), SqlValue::Text(c.name.clone())])
                .collect(),
        };

        let mut entity_columns =
            vec![ColumnDef::new(&layout.entities.key, SqlType::BigInt).primary_key()];
        entity_columns.extend(star.entity_columns.iter().map(|c| {
            let sql_type = match c.kind {
                ColumnKind::Text => SqlType::Varchar,
                ColumnKind::Date => SqlType::Date,
            };
            ColumnDef::new(&c.name, sql_type)
        }));
        let entities = TableBatch {
            name: layout.entities.name.clone(),
            columns: entity_columns,
            rows: star
                .entities
                .iter()
                .map(|e| {
                    let mut row = Vec::with_capacity(e.cells.len() + 1);
                    row.push(SqlValue::Integer(e.entity_key));
                    row.extend(e.cells.iter().map(cell_value));
                    row
                })
                .collect(),
        };

        let junction = TableBatch {
            name: layout.junction.name.clone(),
            columns: vec![
                ColumnDef::new(&layout.entities.key, SqlType::BigInt).primary_key(),
                ColumnDef::new(&layout.categories.key, SqlType::BigInt).primary_key(),
            ],
            rows: star
                .junction
                .iter()
                .map(|j| vec![SqlValue::Integer(j.entity_key), SqlValue::Integer(j.category_key)])
                .collect(),
        };

        [categories, entities, junction]
    }

    /// All three tables are committed together or not at all.
    #[instrument(skip_all, fields(engine = self.connector.engine_name()))]
    pub async fn persist(&self, star: &StarSchema) -> Result<LoadSummary, EtlError> {
        let batches = self.batches(star);
        let counts = self.connector.replace_tables(&batches).await?;

        let tables: Vec<TableLoad> = batches
            .iter()
            .zip(counts)
            .map(|(batch, rows)| TableLoad {
                table: batch.name.clone(),
                rows,
            })
            .collect();

        for load in &tables {
            info!(table = %load.table, rows = load.rows, "Loaded");
        }
        Ok(LoadSummary { tables })
    }
}

fn cell_value(cell: &Cell) -> SqlValue {
    match cell {
        Cell::Null | Cell::InvalidDate(_) => SqlValue::Null,
        Cell::Text(s) => SqlValue::Text(s.clone()),
        Cell::Date(d) => SqlValue::Date(*d),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::transform::{CategoryRow, EntityColumn, EntityRow, JunctionRow};
    use crate::ports::connector::ColumnSchema;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    // --- MOCK CONNECTOR ---
    #[derive(Clone, Default)]
    struct MockConnector {
        received: Arc<Mutex<Vec<TableBatch>>>,
        fail: bool,
    }

    #[async_trait]
    impl Connector for MockConnector {
        async fn execute(&self, _query: &str) -> Result<(), EtlError> {
            Ok(())
        }
        async fn fetch_columns(&self, _table: &str) -> Result<Vec<ColumnSchema>, EtlError> {
            Ok(vec![])
        }
        async fn query_scalar(&self, _query: &str) -> Result<u64, EtlError> {
            Ok(0)
        }
        async fn sample_rows(&self, _t: &str, _l: usize) -> Result<Vec<Vec<String>>, EtlError> {
            Ok(vec![])
        }
        async fn replace_tables(&self, batches: &[TableBatch]) -> Result<Vec<u64>, EtlError> {
            if self.fail {
                return Err(EtlError::InternalError("disk full".into()));
            }
            self.received.lock().unwrap().extend_from_slice(batches);
            Ok(batches.iter().map(|b| b.rows.len() as u64).collect())
        }
        fn engine_name(&self) -> &str {
            "mock"
        }
    }

    fn star() -> StarSchema {
        StarSchema {
            entity_columns: vec![
                EntityColumn {
                    name: "title".into(),
                    kind: ColumnKind::Text,
                },
                EntityColumn {
                    name: "date_added".into(),
                    kind: ColumnKind::Date,
                },
            ],
            entities: vec![
                EntityRow {
                    entity_key: 1,
                    cells: vec![
                        Cell::Text("Movie".into()),
                        Cell::Date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()),
                    ],
                },
                EntityRow {
                    entity_key: 2,
                    cells: vec![Cell::Text("Show".into()), Cell::InvalidDate("bad".into())],
                },
            ],
            categories: vec![CategoryRow {
                category_key: 1,
                name: "Drama".into(),
            }],
            junction: vec![
                JunctionRow {
                    entity_key: 1,
                    category_key: 1,
                },
                JunctionRow {
                    entity_key: 2,
                    category_key: 1,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_persist_in_dependency_order() -> Result<()> {
        let mock = MockConnector::default();
        let layout = TableLayout::default();
        let summary = StarSchemaLoader::new(&mock, &layout).persist(&star()).await?;

        let names: Vec<&str> = summary.tables.iter().map(|t| t.table.as_str()).collect();
        assert_eq!(names, vec!["dim_genres", "dim_movies", "movies_genres"]);
        assert_eq!(summary.rows_for("dim_movies"), Some(2));
        assert_eq!(summary.rows_for("movies_genres"), Some(2));
        assert_eq!(mock.received.lock().unwrap().len(), 3);
        Ok(())
    }

    #[test]
    fn test_entity_batch_layout() {
        let mock = MockConnector::default();
        let layout = TableLayout::default();
        let [_, movies, junction] = StarSchemaLoader::new(&mock, &layout).batches(&star());

        let columns: Vec<(&str, SqlType, bool)> = movies
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.sql_type, c.primary_key))
            .collect();
        assert_eq!(
            columns,
            vec![
                ("movie_id", SqlType::BigInt, true),
                ("title", SqlType::Varchar, false),
                ("date_added", SqlType::Date, false),
            ]
        );
        // Invalid dates are written as NULL
        assert_eq!(movies.rows[1][2], SqlValue::Null);

        let junction_columns: Vec<&str> = junction.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(junction_columns, vec!["movie_id", "genre_id"]);
    }

    #[tokio::test]
    async fn test_failure_is_propagated() {
        let mock = MockConnector {
            fail: true,
            ..MockConnector::default()
        };
        let layout = TableLayout::default();
        let result = StarSchemaLoader::new(&mock, &layout).persist(&star()).await;
        assert!(result.is_err());
    }
}
