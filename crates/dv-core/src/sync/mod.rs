//! Cross-view selection broker ("brushing and linking")
//!
//! A selection made in one view names entities in that view's own terms. The
//! broker resolves those entities back to records of the filtered set and
//! re-projects the records onto every other view's identifying columns.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::value::Record;
use crate::view::{ViewKind, ViewSettings};

/// Identifiers to emphasise in one view
pub type HighlightSet = BTreeSet<String>;

/// Highlight set per view
pub type HighlightMap = BTreeMap<ViewKind, HighlightSet>;

/// Column(s) that identify selected entities in the record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolvingDimension {
    Column(String),
    /// A record matches if any of the columns holds a selected id
    Columns(Vec<String>),
}

impl ResolvingDimension {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            ResolvingDimension::Column(column) => vec![column.as_str()],
            ResolvingDimension::Columns(columns) => columns.iter().map(String::as_str).collect(),
        }
    }
}

/// A selection made in one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEvent {
    pub entity_ids: Vec<String>,
    pub source_view: ViewKind,
    pub resolving_dimension: Option<ResolvingDimension>,
}

impl SelectionEvent {
    pub fn new(source_view: ViewKind, column: &str, entity_ids: Vec<String>) -> Self {
        Self {
            entity_ids,
            source_view,
            resolving_dimension: Some(ResolvingDimension::Column(column.to_string())),
        }
    }

    /// Selection resolved by several columns at once
    pub fn across(source_view: ViewKind, columns: &[&str], entity_ids: Vec<String>) -> Self {
        Self {
            entity_ids,
            source_view,
            resolving_dimension: Some(ResolvingDimension::Columns(
                columns.iter().map(|c| c.to_string()).collect(),
            )),
        }
    }

    /// An empty selection, which clears every highlight
    pub fn clear(source_view: ViewKind) -> Self {
        Self {
            entity_ids: Vec::new(),
            source_view,
            resolving_dimension: None,
        }
    }

    /// Re-select a highlight set inside the view it was projected onto
    pub fn from_highlights(view: ViewKind, settings: &ViewSettings, highlights: &HighlightSet) -> Self {
        let columns = view.identifying_columns(settings);
        Self::across(view, &columns, highlights.iter().cloned().collect())
    }

    pub fn is_clear(&self) -> bool {
        self.entity_ids.is_empty()
    }
}

/// Errors raised while projecting a selection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("selection from {source_view} has no resolving dimension")]
    UnresolvableSelection { source_view: ViewKind },
}

/// Stateless projector of selections across views
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionBroker;

impl SelectionBroker {
    pub fn new() -> Self {
        Self
    }

    /// Records whose resolving column(s) hold one of the selected ids
    pub fn resolve<'a, I>(&self, event: &SelectionEvent, records: I) -> Result<Vec<&'a Record>, SelectionError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let columns = event
            .resolving_dimension
            .as_ref()
            .map(ResolvingDimension::columns)
            .unwrap_or_default();
        if columns.is_empty() {
            tracing::warn!(source = %event.source_view, "dropping selection without a resolving dimension");
            return Err(SelectionError::UnresolvableSelection {
                source_view: event.source_view,
            });
        }

        let wanted: BTreeSet<&str> = event.entity_ids.iter().map(String::as_str).collect();
        Ok(records
            .into_iter()
            .filter(|record| {
                columns
                    .iter()
                    .any(|column| wanted.contains(record.get(column).stringify().as_str()))
            })
            .collect())
    }

    /// Highlight set for every view, given the filtered records and each
    /// view's settings. Views without settings receive an empty set.
    pub fn project<'a, I>(
        &self,
        event: &SelectionEvent,
        records: I,
        settings_by_view: &BTreeMap<ViewKind, ViewSettings>,
    ) -> Result<HighlightMap, SelectionError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        if event.is_clear() {
            tracing::debug!(source = %event.source_view, "clearing highlights in every view");
            return Ok(ViewKind::ALL
                .into_iter()
                .map(|view| (view, HighlightSet::new()))
                .collect());
        }

        let resolved = self.resolve(event, records)?;
        tracing::debug!(
            source = %event.source_view,
            selected = event.entity_ids.len(),
            resolved = resolved.len(),
            "resolved selection"
        );

        let mut highlights = HighlightMap::new();
        for view in ViewKind::ALL {
            if view == event.source_view {
                continue;
            }
            let set = match settings_by_view.get(&view) {
                Some(settings) => resolved
                    .iter()
                    .flat_map(|record| view.identifiers_of(record, settings))
                    .collect(),
                None => HighlightSet::new(),
            };
            highlights.insert(view, set);
        }
        Ok(highlights)
    }
}
