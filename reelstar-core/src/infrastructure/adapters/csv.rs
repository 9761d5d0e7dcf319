// reelstar-core/src/infrastructure/adapters/csv.rs

use csv::{ErrorKind, ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

use crate::domain::record::{RawRecord, RawTable, RecordSchema};
use crate::error::EtlError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::source::RecordSource;

/// Reads a delimited file with a single header row. Every row must have as
/// many fields as the header.
pub struct CsvRecordSource {
    path: PathBuf,
    delimiter: u8,
}

impl CsvRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    /// Non-ASCII delimiters are rejected by configuration validation; here
    /// they fall back to a comma.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = u8::try_from(delimiter).unwrap_or(b',');
        self
    }

    fn malformed(&self, reason: impl Into<String>) -> InfrastructureError {
        InfrastructureError::MalformedSource {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }

    fn map_csv_error(&self, err: csv::Error) -> InfrastructureError {
        let line = err.position().map(|p| p.line());
        let reason = match err.kind() {
            ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => format!("row has {len} field(s), header has {expected_len}"),
            ErrorKind::Utf8 { .. } => "content is not valid UTF-8".to_string(),
            ErrorKind::Io(io) => format!("read error: {io}"),
            _ => err.to_string(),
        };
        match line {
            Some(line) => self.malformed(format!("line {line}: {reason}")),
            None => self.malformed(reason),
        }
    }

    fn read_header(&self, headers: &StringRecord) -> Result<RecordSchema, InfrastructureError> {
        let fields: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
                h.trim().to_string()
            })
            .collect();

        if fields.is_empty() || fields.iter().all(String::is_empty) {
            return Err(self.malformed("no header row"));
        }

        let mut seen = HashSet::new();
        let mut duplicates: Vec<&str> = Vec::new();
        for field in &fields {
            if !seen.insert(field.as_str()) && !duplicates.contains(&field.as_str()) {
                duplicates.push(field);
            }
        }
        if !duplicates.is_empty() {
            return Err(self.malformed(format!(
                "duplicate header name(s): {}",
                duplicates.join(", ")
            )));
        }

        Ok(RecordSchema::new(fields))
    }
}

impl RecordSource for CsvRecordSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn read_records(&self) -> Result<RawTable, EtlError> {
        if !self.path.is_file() {
            return Err(InfrastructureError::SourceUnavailable {
                path: self.path.display().to_string(),
            }
            .into());
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_path(&self.path)
            .map_err(|e| self.map_csv_error(e))?;

        let headers = reader.headers().map_err(|e| self.map_csv_error(e))?.clone();
        let schema = self.read_header(&headers)?;
        debug!(fields = schema.len(), "Header parsed");

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| self.map_csv_error(e))?;
            records.push(RawRecord::new(
                row.iter()
                    .map(|v| (!v.is_empty()).then(|| v.to_string()))
                    .collect(),
            ));
        }

        info!(records = records.len(), "Source read");
        Ok(RawTable::new(schema, records))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
