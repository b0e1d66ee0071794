//! Ingestion: turning raw text into records

pub mod csv_source;
pub mod json_source;

pub use csv_source::CsvSource;
pub use json_source::{parse_json_records, JsonSource};

use async_trait::async_trait;
use dv_core::Record;

use crate::DataError;

/// Trait for dataset sources.
///
/// Reading may happen asynchronously; once the records are returned every
/// later stage of the pipeline is synchronous.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Read and parse the whole dataset
    async fn load_records(&self) -> Result<Vec<Record>, DataError>;

    /// Get the source name/path
    fn source_name(&self) -> &str;
}

/// Where a source reads its text from
#[derive(Debug, Clone)]
pub(crate) enum SourceInput {
    Path(std::path::PathBuf),
    Text { name: String, text: String },
}

impl SourceInput {
    pub(crate) fn name(&self) -> &str {
        match self {
            SourceInput::Path(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown"),
            SourceInput::Text { name, .. } => name,
        }
    }

    pub(crate) async fn read(&self) -> Result<String, DataError> {
        match self {
            SourceInput::Path(path) => Ok(tokio::fs::read_to_string(path).await?),
            SourceInput::Text { text, .. } => Ok(text.clone()),
        }
    }
}
