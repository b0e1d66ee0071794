//! Filter engine: per-column predicates over the record store

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use dv_core::Value;

use crate::schema::{Dimension, DimensionKind, Dimensions};
use crate::store::{FilteredRecordSet, RecordStore};
use crate::DataError;

/// A predicate over one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterSpec {
    /// Inclusive numeric bounds; unparseable values never pass
    Numeric { min: f64, max: f64 },
    /// Allowed stringified values; empty means no restriction
    Categorical { selected: BTreeSet<String> },
}

impl FilterSpec {
    pub fn range(min: f64, max: f64) -> Self {
        FilterSpec::Numeric { min, max }
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterSpec::Categorical {
            selected: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The unrestricted spec for a dimension
    pub fn unrestricted(dimension: &Dimension) -> Self {
        match dimension.kind {
            DimensionKind::Numeric { min, max } => FilterSpec::Numeric { min, max },
            DimensionKind::Categorical { .. } => FilterSpec::Categorical {
                selected: BTreeSet::new(),
            },
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FilterSpec::Numeric { min, max } => value
                .as_number()
                .map(|n| n >= *min && n <= *max)
                .unwrap_or(false),
            FilterSpec::Categorical { selected } => {
                selected.is_empty() || selected.contains(&value.stringify())
            }
        }
    }

    /// Whether this spec excludes anything relative to the dimension's
    /// unrestricted state
    pub fn restricts(&self, dimension: &Dimension) -> bool {
        match (self, &dimension.kind) {
            (FilterSpec::Numeric { min, max }, DimensionKind::Numeric { min: lo, max: hi }) => {
                min > lo || max < hi
            }
            (FilterSpec::Categorical { selected }, _) => !selected.is_empty(),
            // a numeric spec on a categorical column always narrows
            (FilterSpec::Numeric { .. }, DimensionKind::Categorical { .. }) => true,
        }
    }
}

/// Apply every spec to the whole store (logical AND, order preserving)
pub fn apply_filters<'a, I>(store: &RecordStore, specs: I) -> FilteredRecordSet
where
    I: IntoIterator<Item = (&'a str, &'a FilterSpec)>,
{
    refine(&store.all(), specs)
}

/// Narrow an already filtered set by further specs
pub fn refine<'a, I>(set: &FilteredRecordSet, specs: I) -> FilteredRecordSet
where
    I: IntoIterator<Item = (&'a str, &'a FilterSpec)>,
{
    let specs: Vec<(&str, &FilterSpec)> = specs.into_iter().collect();
    let records = set.store().records();
    let rows = set
        .rows()
        .iter()
        .copied()
        .filter(|&row| {
            let record = &records[row];
            specs.iter().all(|(column, spec)| spec.matches(record.get(column)))
        })
        .collect();
    set.store().select(rows)
}

/// Holds the current filter spec of every column.
///
/// Specs persist between applications until cleared or until a new dataset
/// replaces the engine.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    dimensions: Dimensions,
    specs: IndexMap<String, FilterSpec>,
}

impl FilterEngine {
    /// Seed unrestricted specs for every filterable dimension
    pub fn new(dimensions: &Dimensions) -> Self {
        let specs = dimensions
            .filterable()
            .map(|d| (d.name.clone(), FilterSpec::unrestricted(d)))
            .collect();
        Self {
            dimensions: dimensions.clone(),
            specs,
        }
    }

    pub fn spec(&self, column: &str) -> Option<&FilterSpec> {
        self.specs.get(column)
    }

    pub fn specs(&self) -> impl Iterator<Item = (&str, &FilterSpec)> {
        self.specs.iter().map(|(c, s)| (c.as_str(), s))
    }

    /// Replace the spec of one column
    pub fn set(&mut self, column: &str, spec: FilterSpec) -> Result<(), DataError> {
        let dimension = self
            .dimensions
            .get(column)
            .ok_or_else(|| DataError::UnknownColumn(column.to_string()))?;

        match (&spec, dimension.is_numeric()) {
            (FilterSpec::Numeric { min, max }, true) => {
                if min.is_nan() || max.is_nan() || min > max {
                    return Err(DataError::InvalidFilter {
                        column: column.to_string(),
                        reason: format!("invalid range [{}, {}]", min, max),
                    });
                }
            }
            (FilterSpec::Categorical { .. }, false) => {}
            (FilterSpec::Numeric { .. }, false) => {
                return Err(DataError::InvalidFilter {
                    column: column.to_string(),
                    reason: "numeric range on a categorical column".to_string(),
                })
            }
            (FilterSpec::Categorical { .. }, true) => {
                return Err(DataError::InvalidFilter {
                    column: column.to_string(),
                    reason: "value selection on a numeric column".to_string(),
                })
            }
        }

        tracing::debug!(column, ?spec, "filter updated");
        self.specs.insert(column.to_string(), spec);
        Ok(())
    }

    /// Reset one column to its unrestricted spec
    pub fn reset(&mut self, column: &str) -> Result<(), DataError> {
        let dimension = self
            .dimensions
            .get(column)
            .ok_or_else(|| DataError::UnknownColumn(column.to_string()))?;
        self.specs.insert(column.to_string(), FilterSpec::unrestricted(dimension));
        Ok(())
    }

    /// Specs that currently exclude something
    pub fn active(&self) -> Vec<(&str, &FilterSpec)> {
        self.specs()
            .filter(|(column, spec)| {
                self.dimensions
                    .get(column)
                    .map(|d| spec.restricts(d))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Recompute the filtered set from scratch
    pub fn apply(&self, store: &RecordStore) -> FilteredRecordSet {
        let active = self.active();
        let filtered = apply_filters(store, active.iter().copied());
        tracing::info!(
            "Filters applied: {} of {} records match ({} active)",
            filtered.len(),
            store.len(),
            active.len()
        );
        filtered
    }

    /// Reset numeric specs to their full range and categorical specs to no
    /// selection
    pub fn clear(&mut self) {
        for (column, spec) in self.specs.iter_mut() {
            if let Some(dimension) = self.dimensions.get(column) {
                *spec = FilterSpec::unrestricted(dimension);
            }
        }
        tracing::info!("Filters cleared");
    }
}
