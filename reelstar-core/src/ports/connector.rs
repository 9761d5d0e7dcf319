// reelstar-core/src/ports/connector.rs

// What the loader needs from a relational store, without knowing which one.

use crate::error::EtlError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Column description read back from the store.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    BigInt,
    Varchar,
    Date,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::BigInt => "BIGINT",
            SqlType::Varchar => "VARCHAR",
            SqlType::Date => "DATE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
    Date(NaiveDate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
    pub primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// One table to (re)create and fill, rows aligned with `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBatch {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<SqlValue>>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn execute(&self, query: &str) -> Result<(), EtlError>;

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, EtlError>;

    /// First column of the first row, as a non-negative integer.
    async fn query_scalar(&self, query: &str) -> Result<u64, EtlError>;

    /// Up to `limit` rows of a table, every value rendered as text.
    async fn sample_rows(&self, table_name: &str, limit: usize)
    -> Result<Vec<Vec<String>>, EtlError>;

    /// Drops and recreates every batch's table, then inserts its rows, all in
    /// one transaction. Batches are handled in the given order and existing
    /// tables are dropped in reverse order. Returns the inserted row counts.
    async fn replace_tables(&self, batches: &[TableBatch]) -> Result<Vec<u64>, EtlError>;

    fn engine_name(&self) -> &str;
}
