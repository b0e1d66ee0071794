//! Aggregated series for the radial bar view

use dv_core::{roles, Record, ViewKind, ViewSettings};
use dv_data::{Dimensions, FilteredRecordSet};
use indexmap::IndexMap;
use serde::Serialize;

use crate::space_view::{required_column, validate_settings, ShapeTransformer};
use crate::{ViewDataset, ViewError};

/// One bar: a category and the sum of its values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesEntry {
    pub category: String,
    pub value: f64,
}

/// Per-category sums in first-appearance order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedSeries {
    pub entries: Vec<SeriesEntry>,
}

impl AggregatedSeries {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.value)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.value).sum()
    }

    /// Largest bar first, the order the radial layout draws in
    pub fn sorted_by_value_desc(&self) -> Vec<&SeriesEntry> {
        let mut sorted: Vec<&SeriesEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.value.total_cmp(&a.value));
        sorted
    }
}

/// Groups records by `category` and sums `value`
#[derive(Debug, Clone, Copy, Default)]
pub struct RadialBarTransformer;

impl RadialBarTransformer {
    pub fn build<'a, I>(
        &self,
        records: I,
        settings: &ViewSettings,
        dimensions: &Dimensions,
    ) -> Result<AggregatedSeries, ViewError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let view = ViewKind::RadialBar;
        validate_settings(view, settings, dimensions)?;
        let category_column = required_column(view, settings, roles::CATEGORY)?;
        let value_column = required_column(view, settings, roles::VALUE)?;

        let mut sums: IndexMap<String, f64> = IndexMap::new();
        for record in records {
            let sum = sums.entry(record.get(category_column).stringify()).or_insert(0.0);
            // Unparseable values count as null and add nothing
            if let Some(value) = record.get(value_column).as_number() {
                *sum += value;
            }
        }

        tracing::debug!(categories = sums.len(), "built aggregated series");
        Ok(AggregatedSeries {
            entries: sums
                .into_iter()
                .map(|(category, value)| SeriesEntry { category, value })
                .collect(),
        })
    }
}

impl ShapeTransformer for RadialBarTransformer {
    fn kind(&self) -> ViewKind {
        ViewKind::RadialBar
    }

    fn transform(
        &self,
        records: &FilteredRecordSet,
        settings: &ViewSettings,
        dimensions: &Dimensions,
    ) -> Result<ViewDataset, ViewError> {
        self.build(records.iter(), settings, dimensions)
            .map(ViewDataset::AggregatedSeries)
    }
}
