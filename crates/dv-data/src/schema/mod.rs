//! Dimension analysis: classifying columns and summarising their values

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

use dv_core::{ColumnKind, Record, Value, NULL_TOKEN};

use crate::DataError;

/// Analyzer that classifies every column of a dataset
pub struct DimensionAnalyzer {
    max_filter_categories: usize,
}

/// Inferred kind of a column together with its kind-specific summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DimensionKind {
    Numeric { min: f64, max: f64 },
    Categorical { unique_values: Vec<String> },
}

/// Metadata for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub name: String,
    #[serde(flatten)]
    pub kind: DimensionKind,
    pub row_count: usize,
    /// Null or empty values
    pub null_count: usize,
    pub distinct_count: usize,
    /// Whether a filter control should be offered for this column
    pub filterable: bool,
}

impl Dimension {
    pub fn column_kind(&self) -> ColumnKind {
        match self.kind {
            DimensionKind::Numeric { .. } => ColumnKind::Numeric,
            DimensionKind::Categorical { .. } => ColumnKind::Categorical,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, DimensionKind::Numeric { .. })
    }

    /// `(min, max)` of a numeric column
    pub fn range(&self) -> Option<(f64, f64)> {
        match self.kind {
            DimensionKind::Numeric { min, max } => Some((min, max)),
            DimensionKind::Categorical { .. } => None,
        }
    }

    /// Sorted distinct values of a categorical column
    pub fn unique_values(&self) -> Option<&[String]> {
        match &self.kind {
            DimensionKind::Categorical { unique_values } => Some(unique_values),
            DimensionKind::Numeric { .. } => None,
        }
    }
}

/// Dimensions of a dataset, in column order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dimensions {
    columns: IndexMap<String, Dimension>,
}

impl Dimensions {
    pub fn get(&self, column: &str) -> Option<&Dimension> {
        self.columns.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dimension> {
        self.columns.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Dimension> {
        self.iter().filter(|d| d.is_numeric())
    }

    pub fn categorical_columns(&self) -> impl Iterator<Item = &Dimension> {
        self.iter().filter(|d| !d.is_numeric())
    }

    /// Columns a filter UI should build controls for
    pub fn filterable(&self) -> impl Iterator<Item = &Dimension> {
        self.iter().filter(|d| d.filterable)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl DimensionAnalyzer {
    /// Create a new analyzer
    pub fn new() -> Self {
        Self {
            max_filter_categories: 1000,
        }
    }

    /// Categorical columns with more distinct values are not filterable
    pub fn with_max_filter_categories(mut self, limit: usize) -> Self {
        self.max_filter_categories = limit;
        self
    }

    /// Classify every column of `records`.
    ///
    /// The first record's keys are the authoritative column list.
    pub fn analyze(&self, records: &[Record]) -> Result<Dimensions, DataError> {
        let first = records
            .first()
            .ok_or_else(|| DataError::InvalidDataset("no records to analyze".to_string()))?;

        let columns = first
            .columns()
            .map(|column| {
                let dimension = self.analyze_column(records, column);
                tracing::debug!(
                    column,
                    kind = ?dimension.column_kind(),
                    distinct = dimension.distinct_count,
                    nulls = dimension.null_count,
                    "analyzed column"
                );
                (column.to_string(), dimension)
            })
            .collect();

        Ok(Dimensions { columns })
    }

    /// Analyze a single column
    fn analyze_column(&self, records: &[Record], column: &str) -> Dimension {
        let values: Vec<&Value> = records.iter().map(|r| r.get(column)).collect();
        let present: Vec<&Value> = values.iter().copied().filter(|v| !v.is_missing()).collect();

        // A single unparseable value anywhere makes the whole column categorical
        let parsed: Option<Vec<f64>> = present.iter().map(|v| v.as_number()).collect();

        // A column with nothing present has the single value "null", whether
        // its cells are null or empty text
        let unique_values: Vec<String> = if present.is_empty() {
            vec![NULL_TOKEN.to_string()]
        } else {
            values.iter().map(|v| v.stringify()).sorted().dedup().collect()
        };
        let distinct_count = unique_values.len();

        let kind = match parsed {
            Some(numbers) if !numbers.is_empty() => {
                let (min, max) = numbers
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &n| (lo.min(n), hi.max(n)));
                DimensionKind::Numeric { min, max }
            }
            _ => DimensionKind::Categorical { unique_values },
        };

        let filterable = match &kind {
            DimensionKind::Numeric { .. } => true,
            DimensionKind::Categorical { unique_values } => {
                !unique_values.is_empty() && unique_values.len() <= self.max_filter_categories
            }
        };

        Dimension {
            name: column.to_string(),
            kind,
            row_count: values.len(),
            null_count: values.len() - present.len(),
            distinct_count,
            filterable,
        }
    }
}

impl Default for DimensionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
