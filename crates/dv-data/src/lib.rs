//! Data handling for the coordinated-view engine: ingestion, the record
//! store, dimension analysis and filtering

pub mod config;
pub mod filter;
pub mod schema;
pub mod sources;
pub mod store;

use thiserror::Error;

// Re-exports
pub use config::{CsvOptions, EngineConfig};
pub use filter::{apply_filters, FilterEngine, FilterSpec};
pub use schema::{Dimension, DimensionAnalyzer, DimensionKind, Dimensions};
pub use sources::{parse_json_records, CsvSource, DataSource, JsonSource};
pub use store::{FilteredRecordSet, RecordStore};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Invalid filter for '{column}': {reason}")]
    InvalidFilter { column: String, reason: String },

    #[error("Join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}
