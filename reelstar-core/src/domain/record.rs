// reelstar-core/src/domain/record.rs

use chrono::NaiveDate;
use std::fmt;

/// Ordered field names of a source, as read from its header row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSchema {
    fields: Vec<String>,
}

impl RecordSchema {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }
}

/// One input row, cells aligned with the [`RecordSchema`]. `None` means the
/// source had no value for the field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RawRecord {
    pub values: Vec<Option<String>>,
}

impl RawRecord {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Missing means absent, empty or whitespace only.
    pub fn is_missing(&self, index: usize) -> bool {
        self.get(index).is_none_or(|v| v.trim().is_empty())
    }
}

/// Everything a [`crate::ports::source::RecordSource`] hands to the transform.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub schema: RecordSchema,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(schema: RecordSchema, records: Vec<RawRecord>) -> Self {
        Self { schema, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A typed cell once a record has left the cleaning stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Null,
    Text(String),
    Date(NaiveDate),
    /// A date field whose content could not be parsed. The raw text is kept
    /// for diagnostics; it is loaded as NULL.
    InvalidDate(String),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Cell::Null, Cell::Text)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Text(s) | Cell::InvalidDate(s) => f.write_str(s),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A cleaned (and later normalized) record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub cells: Vec<Cell>,
}

impl Record {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.cell(index).and_then(Cell::as_text)
    }
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Self {
            cells: raw.values.into_iter().map(Cell::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    pub schema: RecordSchema,
    pub records: Vec<Record>,
}

impl RecordTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One (entity, category) association produced by the explosion stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExplodedRecord {
    pub entity_id: String,
    pub category: String,
}
