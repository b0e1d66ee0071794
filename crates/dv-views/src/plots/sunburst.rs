//! Nested partition tree for the sunburst view

use dv_core::{roles, Record, ViewKind, ViewSettings};
use dv_data::{Dimensions, FilteredRecordSet};
use serde::Serialize;

use crate::space_view::{required_column, validate_settings, ShapeTransformer};
use crate::{ViewDataset, ViewError};

/// Name of the synthetic node every hierarchy hangs from
pub const ROOT_NAME: &str = "root";

/// A node of the partition tree. Interior values are the sum of their
/// children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub name: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: 0.0,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, name: &str) -> Option<&HierarchyNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Follow a path of child names from this node
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&HierarchyNode> {
        path.iter()
            .try_fold(self, |node, name| node.child(name.as_ref()))
    }

    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(HierarchyNode::leaf_count).sum()
        }
    }

    /// Levels below this node
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    fn child_index(&mut self, name: String) -> usize {
        match self.children.iter().position(|child| child.name == name) {
            Some(index) => index,
            None => {
                self.children.push(HierarchyNode::new(name));
                self.children.len() - 1
            }
        }
    }

    /// Post-order pass: interior nodes take the sum of their children
    fn sum_values(&mut self) -> f64 {
        if !self.children.is_empty() {
            self.value = self.children.iter_mut().map(HierarchyNode::sum_values).sum();
        }
        self.value
    }
}

/// Nests records along the `hierarchy` levels and sums `value` at the leaves
#[derive(Debug, Clone, Copy, Default)]
pub struct SunburstTransformer;

impl SunburstTransformer {
    pub fn build<'a, I>(
        &self,
        records: I,
        settings: &ViewSettings,
        dimensions: &Dimensions,
    ) -> Result<HierarchyNode, ViewError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let view = ViewKind::Sunburst;
        validate_settings(view, settings, dimensions)?;
        let levels = settings.columns(roles::HIERARCHY);
        let value_column = required_column(view, settings, roles::VALUE)?;

        let mut root = HierarchyNode::new(ROOT_NAME);
        for record in records {
            let mut node = &mut root;
            let mut complete = true;
            for column in &levels {
                let level = record.get(column);
                // A missing level is skipped; the walk stays at the current node
                if level.is_missing() {
                    complete = false;
                    continue;
                }
                let index = node.child_index(level.stringify());
                node = &mut node.children[index];
            }
            if complete {
                node.value += record.get(value_column).as_number().unwrap_or(0.0);
            }
        }
        root.sum_values();

        tracing::debug!(
            levels = levels.len(),
            leaves = root.leaf_count(),
            total = root.value,
            "built hierarchy"
        );
        Ok(root)
    }
}

impl ShapeTransformer for SunburstTransformer {
    fn kind(&self) -> ViewKind {
        ViewKind::Sunburst
    }

    fn transform(
        &self,
        records: &FilteredRecordSet,
        settings: &ViewSettings,
        dimensions: &Dimensions,
    ) -> Result<ViewDataset, ViewError> {
        self.build(records.iter(), settings, dimensions)
            .map(ViewDataset::Hierarchy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_core::{record, Value};
    use dv_data::DimensionAnalyzer;
    use proptest::prelude::*;

    fn settings() -> ViewSettings {
        ViewSettings::new()
            .with_many(roles::HIERARCHY, &["region", "city"])
            .with(roles::VALUE, "sales")
    }

    fn build(records: &[Record]) -> HierarchyNode {
        let dimensions = DimensionAnalyzer::new().analyze(records).unwrap();
        SunburstTransformer.build(records, &settings(), &dimensions).unwrap()
    }

    #[test]
    fn test_nested_sums() {
        let records = vec![
            record! { "region" => "EU", "city" => "Oslo", "sales" => 4.0 },
            record! { "region" => "EU", "city" => "Rome", "sales" => 6.0 },
            record! { "region" => "EU", "city" => "Oslo", "sales" => 1.0 },
            record! { "region" => "US", "city" => "Austin", "sales" => 3.0 },
        ];
        let root = build(&records);
        assert_eq!(root.name, ROOT_NAME);
        assert_eq!(root.value, 14.0);
        assert_eq!(root.find(&["EU"]).map(|n| n.value), Some(11.0));
        assert_eq!(root.find(&["EU", "Oslo"]).map(|n| n.value), Some(5.0));
        assert_eq!(root.find(&["US", "Rome"]), None);
        assert_eq!(root.leaf_count(), 3);
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn test_missing_level_skipped() {
        let records = vec![
            record! { "region" => "EU", "city" => "Oslo", "sales" => 4.0 },
            record! { "region" => Value::Null, "city" => "Lima", "sales" => 9.0 },
            record! { "region" => "EU", "city" => "", "sales" => 2.0 },
        ];
        let root = build(&records);
        // Lima hangs directly off the root but carries no value
        assert_eq!(root.find(&["Lima"]).map(|n| n.value), Some(0.0));
        assert_eq!(root.find(&["EU"]).map(|n| n.value), Some(4.0));
        assert_eq!(root.value, 4.0);
    }

    #[test]
    fn test_unparseable_value_counts_as_zero() {
        let records = vec![
            record! { "region" => "EU", "city" => "Oslo", "sales" => 4.0 },
            record! { "region" => "EU", "city" => "Rome", "sales" => Value::Null },
        ];
        let root = build(&records);
        assert_eq!(root.find(&["EU", "Rome"]).map(|n| n.value), Some(0.0));
        assert_eq!(root.value, 4.0);
    }

    #[test]
    fn test_text_values_coerced() {
        let records = vec![
            record! { "region" => "EU", "city" => "Oslo", "sales" => "4" },
            record! { "region" => "EU", "city" => "Rome", "sales" => "2.5" },
            record! { "region" => "US", "city" => "Austin", "sales" => "" },
        ];
        let root = build(&records);
        assert_eq!(root.find(&["EU", "Rome"]).map(|n| n.value), Some(2.5));
        assert_eq!(root.find(&["US", "Austin"]).map(|n| n.value), Some(0.0));
        assert_eq!(root.value, 6.5);
    }

    #[test]
    fn test_leaves_not_serialized_with_children() {
        let records = vec![record! { "region" => "EU", "city" => "Oslo", "sales" => 4.0 }];
        let json = serde_json::to_value(build(&records)).unwrap();
        let leaf = &json["children"][0]["children"][0];
        assert_eq!(leaf["name"], "Oslo");
        assert!(leaf.get("children").is_none());
    }

    fn check_sums(node: &HierarchyNode) -> bool {
        node.is_leaf()
            || ((node.value - node.children.iter().map(|c| c.value).sum::<f64>()).abs() < 1e-9
                && node.children.iter().all(check_sums))
    }

    proptest! {
        #[test]
        fn prop_interior_nodes_sum_children(
            rows in prop::collection::vec(
                (
                    prop::sample::select(vec!["a", "b", ""]),
                    prop::sample::select(vec!["x", "y", ""]),
                    0u32..100,
                ),
                1..30,
            )
        ) {
            let records: Vec<Record> = rows
                .iter()
                .map(|(region, city, sales)| record! { "region" => *region, "city" => *city, "sales" => f64::from(*sales) })
                .collect();
            let root = build(&records);
            prop_assert!(check_sums(&root));

            let complete: f64 = rows
                .iter()
                .filter(|(region, city, _)| !region.is_empty() && !city.is_empty())
                .map(|(_, _, sales)| f64::from(*sales))
                .sum();
            prop_assert_eq!(root.value, complete);
        }
    }
}
