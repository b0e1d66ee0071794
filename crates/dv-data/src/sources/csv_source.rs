use std::path::PathBuf;

use async_trait::async_trait;
use csv::{ReaderBuilder, Trim};
use dv_core::{Record, Value};

use super::{DataSource, SourceInput};
use crate::config::CsvOptions;
use crate::DataError;

/// CSV data source.
///
/// Every non-empty cell is read as text and left to the dimension analyzer
/// to classify; empty cells become `Null`.
pub struct CsvSource {
    input: SourceInput,
    options: CsvOptions,
}

impl CsvSource {
    /// Create a new CSV source from a file path
    pub fn from_path(path: PathBuf, options: CsvOptions) -> Self {
        Self {
            input: SourceInput::Path(path),
            options,
        }
    }

    /// Source backed by text already in memory
    pub fn from_text(name: impl Into<String>, text: impl Into<String>, options: CsvOptions) -> Self {
        Self {
            input: SourceInput::Text {
                name: name.into(),
                text: text.into(),
            },
            options,
        }
    }

    /// Parse CSV text into records
    pub fn parse(text: &str, options: &CsvOptions) -> Result<Vec<Record>, DataError> {
        let delimiter = u8::try_from(options.delimiter).map_err(|_| {
            DataError::Csv(format!("delimiter '{}' is not a single byte", options.delimiter))
        })?;

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(options.has_headers)
            .trim(if options.trim { Trim::All } else { Trim::None })
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = if options.has_headers {
            reader.headers()?.iter().map(str::to_string).collect()
        } else {
            Vec::new()
        };

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let record: Record = row
                .iter()
                .enumerate()
                .map(|(idx, cell)| {
                    let column = headers
                        .get(idx)
                        .cloned()
                        .unwrap_or_else(|| format!("column_{}", idx + 1));
                    let value = if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::from(cell)
                    };
                    (column, value)
                })
                .collect();
            records.push(record);
        }

        if records.is_empty() {
            return Err(DataError::InvalidDataset("CSV data has no rows".to_string()));
        }
        Ok(records)
    }
}

#[async_trait]
impl DataSource for CsvSource {
    async fn load_records(&self) -> Result<Vec<Record>, DataError> {
        let text = self.input.read().await?;
        let options = self.options.clone();
        let records = tokio::task::spawn_blocking(move || Self::parse(&text, &options)).await??;
        tracing::info!("Parsed {} CSV rows from {}", records.len(), self.source_name());
        Ok(records)
    }

    fn source_name(&self) -> &str {
        self.input.name()
    }
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_headers() {
        let records = CsvSource::parse("cat,val\nA, 10\nB,\n", &CsvOptions::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("val"), &Value::from("10"));
        assert_eq!(records[1].get("val"), &Value::Null);
    }

    #[test]
    fn test_parse_without_headers() {
        let options = CsvOptions {
            delimiter: ';',
            has_headers: false,
            trim: true,
        };
        let records = CsvSource::parse("x;1\ny;2\n", &options).unwrap();
        assert_eq!(records[1].get("column_1"), &Value::from("y"));
        assert_eq!(records[1].get("column_2"), &Value::from("2"));
    }

    #[test]
    fn test_header_only_is_invalid() {
        assert!(matches!(
            CsvSource::parse("a,b\n", &CsvOptions::default()),
            Err(DataError::InvalidDataset(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_text() {
        let source = CsvSource::from_text("inline.csv", "a\n1\n2\n", CsvOptions::default());
        assert_eq!(source.load_records().await.unwrap().len(), 2);
    }
}
