//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::DataError;

/// Tunables for ingestion and analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Categorical columns with more distinct values than this are not
    /// offered as filters
    pub max_filter_categories: usize,

    /// CSV ingestion options
    pub csv: CsvOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_filter_categories: 1000,
            csv: CsvOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// CSV reader options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: char,
    pub has_headers: bool,
    /// Trim whitespace around every cell
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_headers: true,
            trim: true,
        }
    }
}
