use std::path::PathBuf;

use async_trait::async_trait;
use dv_core::{Record, Value};

use super::{DataSource, SourceInput};
use crate::DataError;

/// Parse a JSON document that must be a non-empty array of flat objects
pub fn parse_json_records(text: &str) -> Result<Vec<Record>, DataError> {
    let document: serde_json::Value = serde_json::from_str(text)?;

    let items = match document {
        serde_json::Value::Array(items) => items,
        _ => {
            return Err(DataError::InvalidDataset(
                "JSON data must be a non-empty array of objects".to_string(),
            ))
        }
    };
    if items.is_empty() {
        return Err(DataError::InvalidDataset(
            "JSON data must be a non-empty array of objects".to_string(),
        ));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            serde_json::Value::Object(fields) => Ok(fields
                .into_iter()
                .map(|(column, value)| (column, Value::from(value)))
                .collect::<Record>()),
            other => Err(DataError::InvalidDataset(format!(
                "array element {} is not an object (found {})",
                idx,
                json_type_name(&other)
            ))),
        })
        .collect()
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// JSON array-of-objects data source
pub struct JsonSource {
    input: SourceInput,
}

impl JsonSource {
    /// Source backed by a file
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            input: SourceInput::Path(path),
        }
    }

    /// Source backed by text already in memory
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            input: SourceInput::Text {
                name: name.into(),
                text: text.into(),
            },
        }
    }
}

#[async_trait]
impl DataSource for JsonSource {
    async fn load_records(&self) -> Result<Vec<Record>, DataError> {
        let text = self.input.read().await?;
        let records = parse_json_records(&text)?;
        tracing::info!("Parsed {} records from {}", records.len(), self.source_name());
        Ok(records)
    }

    fn source_name(&self) -> &str {
        self.input.name()
    }
}
