//! Shape transformers, one per view

// Categorical aggregate
pub mod bar;

// Flow and network
pub mod chord;
pub mod network;

// Hierarchical
pub mod sunburst;

pub mod utils;

pub use bar::{AggregatedSeries, RadialBarTransformer, SeriesEntry};
pub use chord::{AdjacencyMatrix, ChordTransformer};
pub use network::{ForceDirectedTransformer, GraphEdge, GraphNode, NetworkData};
pub use sunburst::{HierarchyNode, SunburstTransformer};
pub use utils::{Color, OrdinalColorScale};
