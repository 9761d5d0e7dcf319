// reelstar-core/src/domain/project/contract.rs

use tracing::warn;

use crate::domain::error::DomainError;
use crate::domain::project::configuration::SchemaConfig;
use crate::domain::record::{Record, RecordSchema};

/// A field name resolved to its position in the source header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub name: String,
    pub index: usize,
}

/// The schema contract checked against a concrete source header. Every
/// index in here is valid for records of that source.
#[derive(Debug, Clone)]
pub struct TransformPlan {
    pub entity_id: FieldRef,
    pub category: FieldRef,
    pub category_delimiter: String,
    pub required: Vec<FieldRef>,
    pub dates: Vec<FieldRef>,
    pub text: Vec<FieldRef>,
    pub entity_columns: Vec<FieldRef>,
    /// Text fields named in the configuration but absent from the source.
    pub skipped_text: Vec<String>,
}

impl TransformPlan {
    /// Trimmed natural id of a record, `None` when absent or blank.
    pub fn entity_id_of<'r>(&self, record: &'r Record) -> Option<&'r str> {
        record
            .text(self.entity_id.index)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn is_date_field(&self, index: usize) -> bool {
        self.dates.iter().any(|d| d.index == index)
    }
}

impl SchemaConfig {
    /// Validates the source header against this contract. All absent field
    /// names are collected into a single [`DomainError::SchemaViolation`].
    pub fn resolve(&self, schema: &RecordSchema) -> Result<TransformPlan, DomainError> {
        let mut missing: Vec<String> = Vec::new();
        let mut lookup = |name: &str| -> Option<FieldRef> {
            match schema.index_of(name) {
                Some(index) => Some(FieldRef {
                    name: name.to_string(),
                    index,
                }),
                None => {
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                    None
                }
            }
        };

        let entity_id = lookup(self.entity_id.as_str());
        let category = lookup(self.category.as_str());
        let required: Vec<FieldRef> = self.required.iter().filter_map(|f| lookup(f.as_str())).collect();
        let dates: Vec<FieldRef> = self.dates.iter().filter_map(|f| lookup(f.as_str())).collect();
        let entity_columns: Vec<FieldRef> = if self.entity_columns.is_empty() {
            schema
                .fields()
                .iter()
                .enumerate()
                .filter(|(_, name)| **name != self.entity_id && **name != self.category)
                .map(|(index, name)| FieldRef {
                    name: name.clone(),
                    index,
                })
                .collect()
        } else {
            self.entity_columns.iter().filter_map(|f| lookup(f.as_str())).collect()
        };

        let (Some(entity_id), Some(category)) = (entity_id, category) else {
            return Err(violation(missing, schema));
        };
        if !missing.is_empty() {
            return Err(violation(missing, schema));
        }

        // Text fields are best effort: absent ones are skipped, not fatal.
        let mut text = Vec::new();
        let mut skipped_text = Vec::new();
        for name in &self.text {
            match schema.index_of(name) {
                Some(index) => text.push(FieldRef {
                    name: name.clone(),
                    index,
                }),
                None => {
                    warn!(field = %name, "Text field not present in source, skipping");
                    skipped_text.push(name.clone());
                }
            }
        }

        Ok(TransformPlan {
            entity_id,
            category,
            category_delimiter: self.category_delimiter.clone(),
            required,
            dates,
            text,
            entity_columns,
            skipped_text,
        })
    }
}

fn violation(missing: Vec<String>, schema: &RecordSchema) -> DomainError {
    DomainError::SchemaViolation {
        missing,
        available: schema.fields().join(", "),
    }
}
