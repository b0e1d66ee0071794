//! Node/link data for the force-directed view

use dv_core::{roles, Record, ViewKind, ViewSettings};
use dv_data::{Dimensions, FilteredRecordSet};
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

use crate::space_view::{required_column, validate_settings, ShapeTransformer};
use crate::{ViewDataset, ViewError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    /// Incident edges, counting both directions
    pub degree: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Deduplicated nodes and the links between them
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl NetworkData {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|edge| edge.weight).sum()
    }

    /// Directed petgraph view of the data, for layout and traversal
    pub fn to_petgraph(&self) -> DiGraph<String, f64> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut node_indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            node_indices.insert(node.id.as_str(), graph.add_node(node.id.clone()));
        }
        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (
                node_indices.get(edge.source.as_str()),
                node_indices.get(edge.target.as_str()),
            ) {
                graph.add_edge(a, b, edge.weight);
            }
        }
        graph
    }
}

/// Links `nodeId` to `linkTarget`, weighted by the optional `linkValue`
#[derive(Debug, Clone, Copy, Default)]
pub struct ForceDirectedTransformer;

impl ForceDirectedTransformer {
    pub fn build<'a, I>(
        &self,
        records: I,
        settings: &ViewSettings,
        dimensions: &Dimensions,
    ) -> Result<NetworkData, ViewError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let view = ViewKind::ForceDirected;
        validate_settings(view, settings, dimensions)?;
        let node_column = required_column(view, settings, roles::NODE_ID)?;
        let target_column = required_column(view, settings, roles::LINK_TARGET)?;
        let weight_column = settings.column(roles::LINK_VALUE);

        let mut degrees: IndexMap<String, usize> = IndexMap::new();
        let mut edges = Vec::new();
        for record in records {
            let source = record.get(node_column);
            let target = record.get(target_column);
            let source = (!source.is_missing()).then(|| source.stringify());
            let target = (!target.is_missing()).then(|| target.stringify());
            for id in source.iter().chain(target.iter()) {
                degrees.entry(id.clone()).or_insert(0);
            }

            let (Some(source), Some(target)) = (source, target) else {
                continue;
            };
            if source == target {
                continue;
            }
            let weight = weight_column
                .and_then(|column| record.get(column).as_number())
                .filter(|w| *w > 0.0)
                .unwrap_or(1.0);
            for id in [&source, &target] {
                if let Some(degree) = degrees.get_mut(id) {
                    *degree += 1;
                }
            }
            edges.push(GraphEdge { source, target, weight });
        }

        tracing::debug!(nodes = degrees.len(), edges = edges.len(), "built network data");
        Ok(NetworkData {
            nodes: degrees
                .into_iter()
                .map(|(id, degree)| GraphNode { id, degree })
                .collect(),
            edges,
        })
    }
}

impl ShapeTransformer for ForceDirectedTransformer {
    fn kind(&self) -> ViewKind {
        ViewKind::ForceDirected
    }

    fn transform(
        &self,
        records: &FilteredRecordSet,
        settings: &ViewSettings,
        dimensions: &Dimensions,
    ) -> Result<ViewDataset, ViewError> {
        self.build(records.iter(), settings, dimensions)
            .map(ViewDataset::Graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_core::{record, Value};
    use dv_data::DimensionAnalyzer;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn settings(with_weight: bool) -> ViewSettings {
        let settings = ViewSettings::new()
            .with(roles::NODE_ID, "from")
            .with(roles::LINK_TARGET, "to");
        if with_weight {
            settings.with(roles::LINK_VALUE, "w")
        } else {
            settings
        }
    }

    fn build(records: &[Record], with_weight: bool) -> NetworkData {
        let dimensions = DimensionAnalyzer::new().analyze(records).unwrap();
        ForceDirectedTransformer
            .build(records, &settings(with_weight), &dimensions)
            .unwrap()
    }

    #[test]
    fn test_nodes_and_edges() {
        let records = vec![
            record! { "from" => "a", "to" => "b", "w" => 2.0 },
            record! { "from" => "b", "to" => "c", "w" => 0.0 },
            record! { "from" => "a", "to" => "b", "w" => 5.0 },
        ];
        let graph = build(&records, true);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let weights: Vec<f64> = graph.edges.iter().map(|e| e.weight).collect();
        // non-positive weights fall back to 1, parallel edges are kept
        assert_eq!(weights, vec![2.0, 1.0, 5.0]);
        assert_eq!(graph.node("b").map(|n| n.degree), Some(3));
        assert_eq!(graph.total_weight(), 8.0);
    }

    #[test]
    fn test_text_link_values() {
        let analyzed = vec![
            record! { "from" => "a", "to" => "b", "w" => "4" },
            record! { "from" => "c", "to" => "a", "w" => "-2" },
        ];
        let dimensions = DimensionAnalyzer::new().analyze(&analyzed).unwrap();
        assert!(dimensions.get("w").unwrap().is_numeric());

        // A weight that does not parse falls back to 1 like a non-positive one
        let mut records = analyzed.clone();
        records.push(record! { "from" => "b", "to" => "c", "w" => "abc" });
        let graph = ForceDirectedTransformer
            .build(&records, &settings(true), &dimensions)
            .unwrap();
        let weights: Vec<f64> = graph.edges.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![4.0, 1.0, 1.0]);
    }

    #[test]
    fn test_self_loops_and_missing_endpoints() {
        let records = vec![
            record! { "from" => "a", "to" => "a" },
            record! { "from" => "b", "to" => Value::Null },
            record! { "from" => "", "to" => "c" },
        ];
        let graph = build(&records, false);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(graph.edges.is_empty());
        assert!(graph.nodes.iter().all(|n| n.degree == 0));
    }

    #[test]
    fn test_numeric_ids_stringified() {
        let records = vec![record! { "from" => 1.0, "to" => 2.0 }];
        let graph = build(&records, false);
        assert_eq!(
            graph.edges,
            vec![GraphEdge { source: "1".into(), target: "2".into(), weight: 1.0 }]
        );
    }

    #[test]
    fn test_to_petgraph() {
        let records = vec![
            record! { "from" => "a", "to" => "b" },
            record! { "from" => "b", "to" => "c" },
        ];
        let graph = build(&records, false).to_petgraph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    proptest! {
        #[test]
        fn prop_no_duplicate_nodes_or_self_loops(
            rows in prop::collection::vec(
                (prop::sample::select(vec!["a", "b", "c", ""]), prop::sample::select(vec!["a", "b", "d", ""])),
                1..30,
            )
        ) {
            let records: Vec<Record> = rows
                .iter()
                .map(|(from, to)| record! { "from" => *from, "to" => *to })
                .collect();
            let graph = build(&records, false);

            let unique: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
            prop_assert_eq!(unique.len(), graph.nodes.len());
            prop_assert!(graph.edges.iter().all(|e| e.source != e.target));
            prop_assert!(graph.nodes.iter().all(|n| !n.id.is_empty()));
            for edge in &graph.edges {
                prop_assert!(unique.contains(edge.source.as_str()));
                prop_assert!(unique.contains(edge.target.as_str()));
            }
        }
    }
}
