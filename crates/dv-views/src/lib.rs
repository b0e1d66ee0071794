//! View system for the coordinated-view engine: shape transformers that turn
//! the filtered records into per-view datasets, and the viewport that ties
//! loading, filtering, rendering and selection together

mod space_view;
mod viewport;
pub mod plots;

pub use space_view::{transformer_for, ShapeTransformer};
pub use viewport::{LoadSummary, Viewport};
pub use plots::{
    AdjacencyMatrix, AggregatedSeries, ChordTransformer, Color, ForceDirectedTransformer, GraphEdge,
    GraphNode, HierarchyNode, NetworkData, OrdinalColorScale, RadialBarTransformer, SeriesEntry,
    SunburstTransformer,
};

use dv_core::sync::SelectionError;
use dv_core::ViewKind;
use dv_data::DataError;
use serde::Serialize;
use thiserror::Error;

/// Errors produced while building or coordinating views
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("{view}: required setting '{role}' is not selected")]
    IncompleteSettings { view: ViewKind, role: String },

    #[error("{view}: {message}")]
    Transform { view: ViewKind, message: String },

    #[error("no dataset loaded")]
    NoDataset,

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl ViewError {
    pub(crate) fn transform(view: ViewKind, message: impl Into<String>) -> Self {
        ViewError::Transform {
            view,
            message: message.into(),
        }
    }

    /// Whether the view should show a "select the required fields" placeholder
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ViewError::IncompleteSettings { .. })
    }
}

/// The shaped data a view renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum ViewDataset {
    AggregatedSeries(AggregatedSeries),
    AdjacencyMatrix(AdjacencyMatrix),
    Graph(NetworkData),
    Hierarchy(HierarchyNode),
}

impl ViewDataset {
    pub fn as_series(&self) -> Option<&AggregatedSeries> {
        match self {
            ViewDataset::AggregatedSeries(series) => Some(series),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&AdjacencyMatrix> {
        match self {
            ViewDataset::AdjacencyMatrix(matrix) => Some(matrix),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&NetworkData> {
        match self {
            ViewDataset::Graph(graph) => Some(graph),
            _ => None,
        }
    }

    pub fn as_hierarchy(&self) -> Option<&HierarchyNode> {
        match self {
            ViewDataset::Hierarchy(root) => Some(root),
            _ => None,
        }
    }
}
