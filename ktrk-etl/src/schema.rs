//! Declarative row schema and validator
//!
//! The contract per source: a JSON schema object with `required` (field
//! names that must be present and non-blank) and optionally
//! `properties.<field>.enum` (allowed values for constrained fields).
//! Validation partitions rows into valid and invalid; it never raises.
//! Invalid rows accumulate every failing reason (required-field reasons
//! first, then enum reasons) along with their zero-based original position.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use ktrk_common::rows::Row;
use ktrk_common::{Error, Result};

/// Per-field constraints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Property {
    /// Allowed values, when the field is enum-constrained
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

/// One source's row schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Property>,
}

impl Schema {
    /// Load `<schemas_dir>/<schema_ref>.json`
    pub fn load(schemas_dir: &Path, schema_ref: &str) -> Result<Self> {
        let path = schemas_dir.join(format!("{schema_ref}.json"));
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read schema {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid schema {}: {}", path.display(), e)))
    }
}

/// A row that failed validation, with why and where
#[derive(Debug, Clone, Serialize)]
pub struct InvalidRow {
    pub row: Row,
    /// All failing reasons, human readable
    pub reasons: Vec<String>,
    /// Zero-based position in the extracted input
    pub index: usize,
}

impl InvalidRow {
    /// Reasons joined for the quarantine file's error column
    pub fn error_text(&self) -> String {
        self.reasons.join("; ")
    }
}

/// Partition rows into (valid, invalid)
pub fn validate_rows(rows: &[Row], schema: &Schema) -> (Vec<Row>, Vec<InvalidRow>) {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let reasons = row_reasons(row, schema);
        if reasons.is_empty() {
            valid.push(row.clone());
        } else {
            invalid.push(InvalidRow {
                row: row.clone(),
                reasons,
                index,
            });
        }
    }

    (valid, invalid)
}

fn row_reasons(row: &Row, schema: &Schema) -> Vec<String> {
    let mut reasons = Vec::new();

    for field in &schema.required {
        let blank = row.get(field).map(|v| v.trim().is_empty()).unwrap_or(true);
        if blank {
            reasons.push(format!("missing required field: {field}"));
        }
    }

    for (field, property) in &schema.properties {
        let Some(allowed) = &property.allowed else {
            continue;
        };
        // Blank enum fields are the required check's concern, not ours
        let value = row.get_or_empty(field).trim();
        if value.is_empty() {
            continue;
        }
        if !allowed.iter().any(|a| a == value) {
            reasons.push(format!(
                "{} must be one of [{}], got '{}'",
                field,
                allowed.join(", "),
                value
            ));
        }
    }

    reasons
}
