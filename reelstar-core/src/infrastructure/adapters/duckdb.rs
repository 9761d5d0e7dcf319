// reelstar-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::{Config, Connection, params, params_from_iter};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

use crate::domain::project::IN_MEMORY_DATABASE;
use crate::domain::sql::quote_ident;
use crate::error::EtlError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::{ColumnSchema, Connector, SqlValue, TableBatch};

pub struct DuckDBConnector {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDBConnector {
    /// Opens (or creates) a database file. The parent directory is created
    /// when missing.
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == IN_MEMORY_DATABASE {
            Connection::open_in_memory_with_flags(config)?
        } else {
            let parent = Path::new(db_path).parent();
            if let Some(parent) = parent.filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an existing database file; a missing file is an error instead of
    /// a fresh empty database.
    pub fn open_existing(db_path: &str) -> Result<Self, InfrastructureError> {
        if db_path != IN_MEMORY_DATABASE && !Path::new(db_path).is_file() {
            return Err(InfrastructureError::SourceUnavailable {
                path: db_path.to_string(),
            });
        }
        Self::new(db_path)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

fn to_duckdb_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::BigInt(*i),
        SqlValue::Text(s) => Value::Text(s.clone()),
        // Bound as ISO text, cast by the DATE column on insert
        SqlValue::Date(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
    }
}

fn create_table_sql(batch: &TableBatch) -> String {
    let mut defs: Vec<String> = batch
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.sql_type.as_sql()))
        .collect();
    let keys: Vec<String> = batch
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| quote_ident(&c.name))
        .collect();
    if !keys.is_empty() {
        defs.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }
    format!("CREATE TABLE {} ({})", quote_ident(&batch.name), defs.join(", "))
}

fn insert_sql(batch: &TableBatch) -> String {
    let columns: Vec<String> = batch.columns.iter().map(|c| quote_ident(&c.name)).collect();
    let placeholders = vec!["?"; batch.columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&batch.name),
        columns.join(", "),
        placeholders
    )
}

fn write_batches(conn: &Connection, batches: &[TableBatch]) -> Result<Vec<u64>, duckdb::Error> {
    for batch in batches.iter().rev() {
        let sql = format!("DROP TABLE IF EXISTS {}", quote_ident(&batch.name));
        debug!(sql = %sql, "Dropping previous table");
        conn.execute_batch(&sql)?;
    }

    let mut counts = Vec::with_capacity(batches.len());
    for batch in batches {
        let ddl = create_table_sql(batch);
        debug!(sql = %ddl, "Creating table");
        conn.execute_batch(&ddl)?;

        let mut stmt = conn.prepare(&insert_sql(batch))?;
        let mut inserted = 0u64;
        for row in &batch.rows {
            inserted += stmt.execute(params_from_iter(row.iter().map(to_duckdb_value)))? as u64;
        }
        info!(table = %batch.name, rows = inserted, "Table written");
        counts.push(inserted);
    }
    Ok(counts)
}

#[async_trait]
impl Connector for DuckDBConnector {
    async fn execute(&self, query: &str) -> Result<(), EtlError> {
        let conn = self.lock()?;
        debug!(sql = %query, "Executing");
        conn.execute_batch(query)?;
        Ok(())
    }

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, EtlError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
             WHERE table_name = ? ORDER BY ordinal_position",
        )?;

        let rows = stmt.query_map(params![table_name], |row| {
            Ok(ColumnSchema {
                name: row.get(0)?,
                data_type: row.get(1)?,
                is_nullable: row.get::<_, String>(2)? == "YES",
            })
        })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    async fn query_scalar(&self, query: &str) -> Result<u64, EtlError> {
        let conn = self.lock()?;
        debug!(sql = %query, "Scalar query");
        let mut stmt = conn.prepare(query)?;
        let mut rows = stmt.query([])?;

        let row = rows
            .next()?
            .ok_or_else(|| EtlError::InternalError("No scalar value returned".into()))?;

        let value: Option<i64> = row.get(0)?;
        u64::try_from(value.unwrap_or(0))
            .map_err(|_| EtlError::InternalError(format!("Negative scalar from: {query}")))
    }

    async fn sample_rows(
        &self,
        table_name: &str,
        limit: usize,
    ) -> Result<Vec<Vec<String>>, EtlError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT COLUMNS(*)::VARCHAR FROM {} LIMIT {}",
            quote_ident(table_name),
            limit
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let width = row.as_ref().column_count();
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                let value: Option<String> = row.get(i)?;
                values.push(value.unwrap_or_else(|| "NULL".to_string()));
            }
            out.push(values);
        }
        Ok(out)
    }

    #[instrument(skip_all, fields(tables = batches.len()))]
    async fn replace_tables(&self, batches: &[TableBatch]) -> Result<Vec<u64>, EtlError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        // Dropping the transaction without commit rolls it back
        let counts = write_batches(&tx, batches)?;
        tx.commit()?;

        // Flush the WAL; failure here leaves committed data intact
        if let Err(e) = conn.execute_batch("CHECKPOINT") {
            debug!(error = %e, "CHECKPOINT failed after commit");
        }
        Ok(counts)
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}
