//! Adjacency matrix for the chord view

use dv_core::{roles, Record, ViewKind, ViewSettings};
use dv_data::{Dimensions, FilteredRecordSet};
use itertools::Itertools;
use serde::Serialize;

use crate::space_view::{required_column, validate_settings, ShapeTransformer};
use crate::{ViewDataset, ViewError};

/// Directed flow totals between entities.
///
/// `matrix[i][j]` is the summed value flowing from `entities[i]` to
/// `entities[j]`; entities are sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdjacencyMatrix {
    pub entities: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
}

impl AdjacencyMatrix {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn index_of(&self, entity: &str) -> Option<usize> {
        self.entities
            .binary_search_by(|probe| probe.as_str().cmp(entity))
            .ok()
    }

    pub fn flow(&self, source: &str, target: &str) -> Option<f64> {
        Some(self.matrix[self.index_of(source)?][self.index_of(target)?])
    }

    /// Total flowing out of entity `i` (its row sum)
    pub fn outgoing_total(&self, i: usize) -> f64 {
        self.matrix.get(i).map(|row| row.iter().sum()).unwrap_or(0.0)
    }

    /// Total flowing into entity `j` (its column sum)
    pub fn incoming_total(&self, j: usize) -> f64 {
        self.matrix.iter().filter_map(|row| row.get(j)).sum()
    }
}

/// Sums `value` between `source` and `target` entities
#[derive(Debug, Clone, Copy, Default)]
pub struct ChordTransformer;

impl ChordTransformer {
    pub fn build<'a, I>(
        &self,
        records: I,
        settings: &ViewSettings,
        dimensions: &Dimensions,
    ) -> Result<AdjacencyMatrix, ViewError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let view = ViewKind::Chord;
        validate_settings(view, settings, dimensions)?;
        let source_column = required_column(view, settings, roles::SOURCE)?;
        let target_column = required_column(view, settings, roles::TARGET)?;
        let value_column = required_column(view, settings, roles::VALUE)?;

        // Only positive flows take part, including in the entity index
        let flows: Vec<(String, String, f64)> = records
            .into_iter()
            .filter_map(|record| {
                let value = record.get(value_column).as_number().filter(|v| *v > 0.0)?;
                Some((
                    record.get(source_column).stringify(),
                    record.get(target_column).stringify(),
                    value,
                ))
            })
            .collect();

        let entities: Vec<String> = flows
            .iter()
            .flat_map(|(source, target, _)| [source.clone(), target.clone()])
            .sorted()
            .dedup()
            .collect();

        let mut adjacency = AdjacencyMatrix {
            matrix: vec![vec![0.0; entities.len()]; entities.len()],
            entities,
        };
        for (source, target, value) in &flows {
            if let (Some(i), Some(j)) = (adjacency.index_of(source), adjacency.index_of(target)) {
                adjacency.matrix[i][j] += value;
            }
        }

        tracing::debug!(
            entities = adjacency.entities.len(),
            flows = flows.len(),
            "built adjacency matrix"
        );
        Ok(adjacency)
    }
}

impl ShapeTransformer for ChordTransformer {
    fn kind(&self) -> ViewKind {
        ViewKind::Chord
    }

    fn transform(
        &self,
        records: &FilteredRecordSet,
        settings: &ViewSettings,
        dimensions: &Dimensions,
    ) -> Result<ViewDataset, ViewError> {
        self.build(records.iter(), settings, dimensions)
            .map(ViewDataset::AdjacencyMatrix)
    }
}
