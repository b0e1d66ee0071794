//! Viewport - the session coordinator behind the four views.
//!
//! Owns the current dataset snapshot, the per-view settings and the shared
//! colour scale. Loads build a complete snapshot before swapping it in, so a
//! failed load never disturbs the views on screen.

use std::collections::BTreeMap;
use std::sync::Arc;

use dv_core::events::events::{
    DatasetLoaded, DatasetRejected, FiltersApplied, FiltersCleared, SelectionProjected, ViewUnavailable,
};
use dv_core::{EventBus, HighlightMap, Record, SelectionBroker, SelectionEvent, ViewKind, ViewSettings};
use dv_data::{
    parse_json_records, CsvSource, DataError, DataSource, DimensionAnalyzer, Dimensions, EngineConfig,
    FilterEngine, FilterSpec, FilteredRecordSet, RecordStore,
};
use serde::Serialize;

use crate::plots::{Color, OrdinalColorScale};
use crate::space_view::transformer_for;
use crate::{ViewDataset, ViewError};

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    pub source_name: String,
    pub row_count: usize,
    pub column_count: usize,
}

/// Everything derived from one dataset
#[derive(Debug, Clone)]
struct Snapshot {
    store: RecordStore,
    dimensions: Dimensions,
    filters: FilterEngine,
    filtered: FilteredRecordSet,
}

pub struct Viewport {
    config: EngineConfig,
    snapshot: Option<Snapshot>,
    settings: BTreeMap<ViewKind, ViewSettings>,
    colors: OrdinalColorScale,
    broker: SelectionBroker,
    event_bus: Arc<EventBus>,
}

impl Viewport {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_event_bus(config, Arc::new(EventBus::new()))
    }

    pub fn with_event_bus(config: EngineConfig, event_bus: Arc<EventBus>) -> Self {
        Self {
            config,
            snapshot: None,
            settings: BTreeMap::new(),
            colors: OrdinalColorScale::new(),
            broker: SelectionBroker::new(),
            event_bus,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    /// Load a JSON array of flat objects
    pub fn load_json(&mut self, source_name: &str, text: &str) -> Result<LoadSummary, DataError> {
        let records = parse_json_records(text).map_err(|e| self.reject(source_name, e))?;
        self.load_records(source_name, records)
    }

    /// Load CSV text using the configured reader options
    pub fn load_csv(&mut self, source_name: &str, text: &str) -> Result<LoadSummary, DataError> {
        let records = CsvSource::parse(text, &self.config.csv).map_err(|e| self.reject(source_name, e))?;
        self.load_records(source_name, records)
    }

    /// Load whatever a data source yields
    pub async fn load_from(&mut self, source: &dyn DataSource) -> Result<LoadSummary, DataError> {
        let source_name = source.source_name();
        let records = source
            .load_records()
            .await
            .map_err(|e| self.reject(source_name, e))?;
        self.load_records(source_name, records)
    }

    /// Replace the current dataset. View settings are discarded since their
    /// columns may not exist in the new data.
    pub fn load_records(&mut self, source_name: &str, records: Vec<Record>) -> Result<LoadSummary, DataError> {
        let snapshot = self
            .build_snapshot(source_name, records)
            .map_err(|e| self.reject(source_name, e))?;

        let summary = LoadSummary {
            source_name: source_name.to_string(),
            row_count: snapshot.store.len(),
            column_count: snapshot.dimensions.len(),
        };
        self.snapshot = Some(snapshot);
        self.settings.clear();
        self.colors.reset();

        tracing::info!(
            "Loaded '{}': {} records, {} columns",
            summary.source_name,
            summary.row_count,
            summary.column_count
        );
        self.event_bus.publish(DatasetLoaded {
            source_name: summary.source_name.clone(),
            row_count: summary.row_count,
            column_count: summary.column_count,
        });
        Ok(summary)
    }

    fn build_snapshot(&self, source_name: &str, records: Vec<Record>) -> Result<Snapshot, DataError> {
        let dimensions = DimensionAnalyzer::new()
            .with_max_filter_categories(self.config.max_filter_categories)
            .analyze(&records)?;
        let store = RecordStore::new(source_name, records)?;
        let filters = FilterEngine::new(&dimensions);
        let filtered = store.all();
        Ok(Snapshot {
            store,
            dimensions,
            filters,
            filtered,
        })
    }

    fn reject(&self, source_name: &str, error: DataError) -> DataError {
        tracing::warn!("Rejected dataset '{}': {}", source_name, error);
        self.event_bus.publish(DatasetRejected {
            source_name: source_name.to_string(),
            error: error.to_string(),
        });
        error
    }

    /// Drop the current dataset and everything derived from it
    pub fn unload(&mut self) {
        self.snapshot = None;
        self.settings.clear();
        self.colors.reset();
    }

    pub fn has_dataset(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn store(&self) -> Option<&RecordStore> {
        self.snapshot.as_ref().map(|s| &s.store)
    }

    pub fn dimensions(&self) -> Option<&Dimensions> {
        self.snapshot.as_ref().map(|s| &s.dimensions)
    }

    /// The records the views currently see
    pub fn filtered(&self) -> Option<&FilteredRecordSet> {
        self.snapshot.as_ref().map(|s| &s.filtered)
    }

    pub fn filters(&self) -> Option<&FilterEngine> {
        self.snapshot.as_ref().map(|s| &s.filters)
    }

    fn snapshot_mut(&mut self) -> Result<&mut Snapshot, ViewError> {
        self.snapshot.as_mut().ok_or(ViewError::NoDataset)
    }

    // Settings

    pub fn set_view_settings(&mut self, view: ViewKind, settings: ViewSettings) {
        tracing::debug!(%view, ?settings, "view settings changed");
        self.settings.insert(view, settings);
    }

    pub fn view_settings(&self, view: ViewKind) -> Option<&ViewSettings> {
        self.settings.get(&view)
    }

    pub fn clear_view_settings(&mut self, view: ViewKind) {
        self.settings.remove(&view);
    }

    // Filters

    /// Stage a filter; it takes effect on the next [`Viewport::apply_filters`]
    pub fn set_filter(&mut self, column: &str, spec: FilterSpec) -> Result<(), ViewError> {
        let snapshot = self.snapshot_mut()?;
        snapshot.filters.set(column, spec).map_err(|e| {
            tracing::warn!("Filter on '{}' rejected: {}", column, e);
            ViewError::from(e)
        })
    }

    /// Reset one column's filter to unrestricted
    pub fn remove_filter(&mut self, column: &str) -> Result<(), ViewError> {
        let snapshot = self.snapshot_mut()?;
        snapshot.filters.reset(column)?;
        Ok(())
    }

    /// Recompute the filtered set; returns the number of matching records
    pub fn apply_filters(&mut self) -> Result<usize, ViewError> {
        let snapshot = self.snapshot_mut()?;
        snapshot.filtered = snapshot.filters.apply(&snapshot.store);
        let event = FiltersApplied {
            matched_rows: snapshot.filtered.len(),
            total_rows: snapshot.store.len(),
            active_filters: snapshot.filters.active().len(),
        };
        let matched = event.matched_rows;
        self.event_bus.publish(event);
        Ok(matched)
    }

    /// Reset every filter and restore the full store
    pub fn clear_filters(&mut self) -> Result<(), ViewError> {
        let snapshot = self.snapshot_mut()?;
        snapshot.filters.clear();
        snapshot.filtered = snapshot.filters.apply(&snapshot.store);
        let total_rows = snapshot.store.len();
        self.event_bus.publish(FiltersCleared { total_rows });
        Ok(())
    }

    // Rendering

    /// Build one view's dataset from the current filtered records
    pub fn render(&self, view: ViewKind) -> Result<ViewDataset, ViewError> {
        let result = match &self.snapshot {
            None => Err(ViewError::NoDataset),
            Some(snapshot) => {
                let default_settings = ViewSettings::default();
                let settings = self.settings.get(&view).unwrap_or(&default_settings);
                transformer_for(view).transform(&snapshot.filtered, settings, &snapshot.dimensions)
            }
        };

        if let Err(e) = &result {
            if e.is_incomplete() {
                tracing::debug!(%view, "view waiting for settings: {}", e);
            } else {
                tracing::warn!(%view, "view unavailable: {}", e);
            }
            self.event_bus.publish(ViewUnavailable {
                view,
                reason: e.to_string(),
            });
        }
        result
    }

    /// Render every view; one view's failure never affects the others
    pub fn render_all(&self) -> BTreeMap<ViewKind, Result<ViewDataset, ViewError>> {
        ViewKind::ALL
            .into_iter()
            .map(|view| (view, self.render(view)))
            .collect()
    }

    // Selection

    /// Project a selection made in one view onto the others
    pub fn select(&self, event: &SelectionEvent) -> Result<HighlightMap, ViewError> {
        let highlights = match &self.snapshot {
            Some(snapshot) => self.broker.project(event, snapshot.filtered.iter(), &self.settings),
            None => self.broker.project(event, std::iter::empty(), &self.settings),
        }
        .map_err(|e| {
            tracing::warn!("Selection dropped: {}", e);
            ViewError::from(e)
        })?;

        let resolved_rows = match (&self.snapshot, event.is_clear()) {
            (Some(snapshot), false) => self
                .broker
                .resolve(event, snapshot.filtered.iter())
                .map(|rows| rows.len())
                .unwrap_or(0),
            _ => 0,
        };
        self.event_bus.publish(SelectionProjected {
            source_view: event.source_view,
            resolved_rows,
            cleared: event.is_clear(),
        });
        Ok(highlights)
    }

    // Colours

    /// Colour for an entity, stable across every view until the next load
    pub fn color_for(&mut self, key: &str) -> Color {
        self.colors.color_for(key)
    }

    pub fn color_scale(&self) -> &OrdinalColorScale {
        &self.colors
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_core::roles;
    use dv_core::HighlightSet;
    use dv_data::JsonSource;
    use parking_lot::Mutex;

    const SALES: &str = r#"[
        {"region": "EU", "city": "Oslo", "partner": "Rome", "amount": 4, "year": 2020},
        {"region": "EU", "city": "Rome", "partner": "Oslo", "amount": 6, "year": 2021},
        {"region": "US", "city": "Austin", "partner": "Boston", "amount": 3, "year": 2022},
        {"region": "US", "city": "Boston", "partner": null, "amount": 7, "year": 2023}
    ]"#;

    fn loaded() -> Viewport {
        let mut viewport = Viewport::default();
        viewport.load_json("sales.json", SALES).unwrap();
        viewport.set_view_settings(
            ViewKind::RadialBar,
            ViewSettings::new().with(roles::CATEGORY, "region").with(roles::VALUE, "amount"),
        );
        viewport.set_view_settings(
            ViewKind::Chord,
            ViewSettings::new()
                .with(roles::SOURCE, "city")
                .with(roles::TARGET, "partner")
                .with(roles::VALUE, "amount"),
        );
        viewport.set_view_settings(
            ViewKind::ForceDirected,
            ViewSettings::new().with(roles::NODE_ID, "city").with(roles::LINK_TARGET, "partner"),
        );
        viewport.set_view_settings(
            ViewKind::Sunburst,
            ViewSettings::new()
                .with_many(roles::HIERARCHY, &["region", "city"])
                .with(roles::VALUE, "amount"),
        );
        viewport
    }

    fn set(ids: &[&str]) -> HighlightSet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_and_render_all() {
        let viewport = loaded();
        let summary = viewport.store().map(RecordStore::len);
        assert_eq!(summary, Some(4));

        let rendered = viewport.render_all();
        assert!(rendered.values().all(Result::is_ok));

        let series = viewport.render(ViewKind::RadialBar).unwrap();
        let series = series.as_series().unwrap();
        assert_eq!(series.get("EU"), Some(10.0));
        assert_eq!(series.get("US"), Some(10.0));

        let hierarchy = viewport.render(ViewKind::Sunburst).unwrap();
        assert_eq!(hierarchy.as_hierarchy().map(|root| root.value), Some(20.0));
    }

    #[test]
    fn test_views_fail_independently() {
        let mut viewport = loaded();
        viewport.clear_view_settings(ViewKind::Chord);
        viewport.set_view_settings(
            ViewKind::Sunburst,
            ViewSettings::new().with(roles::HIERARCHY, "nowhere").with(roles::VALUE, "amount"),
        );

        let rendered = viewport.render_all();
        assert!(rendered[&ViewKind::RadialBar].is_ok());
        assert!(rendered[&ViewKind::ForceDirected].is_ok());
        assert!(matches!(
            rendered[&ViewKind::Chord],
            Err(ViewError::IncompleteSettings { view: ViewKind::Chord, .. })
        ));
        assert!(matches!(rendered[&ViewKind::Sunburst], Err(ViewError::Transform { .. })));
    }

    #[test]
    fn test_filter_then_clear_restores_everything() {
        let mut viewport = loaded();
        viewport.set_filter("year", FilterSpec::range(2021.0, 2022.0)).unwrap();
        assert_eq!(viewport.apply_filters().unwrap(), 2);

        let series = viewport.render(ViewKind::RadialBar).unwrap();
        assert_eq!(series.as_series().and_then(|s| s.get("EU")), Some(6.0));

        viewport.clear_filters().unwrap();
        let filtered = viewport.filtered().unwrap();
        assert!(filtered.is_unfiltered());
        assert_eq!(filtered, &viewport.store().unwrap().all());
    }

    #[test]
    fn test_filter_validation() {
        let mut viewport = loaded();
        assert!(matches!(
            viewport.set_filter("missing", FilterSpec::range(0.0, 1.0)),
            Err(ViewError::Data(DataError::UnknownColumn(_)))
        ));
        assert!(viewport.set_filter("region", FilterSpec::range(0.0, 1.0)).is_err());

        viewport.set_filter("region", FilterSpec::one_of(["US"])).unwrap();
        assert_eq!(viewport.apply_filters().unwrap(), 2);
        viewport.remove_filter("region").unwrap();
        assert_eq!(viewport.apply_filters().unwrap(), 4);
    }

    #[test]
    fn test_selection_projects_to_other_views() {
        let viewport = loaded();
        let highlights = viewport
            .select(&SelectionEvent::new(ViewKind::RadialBar, "region", vec!["EU".into()]))
            .unwrap();

        assert!(!highlights.contains_key(&ViewKind::RadialBar));
        assert_eq!(highlights[&ViewKind::Chord], set(&["Oslo", "Rome"]));
        assert_eq!(highlights[&ViewKind::ForceDirected], set(&["Oslo", "Rome"]));
        assert_eq!(highlights[&ViewKind::Sunburst], set(&["EU"]));
    }

    #[test]
    fn test_highlights_name_rendered_entities() {
        let viewport = loaded();
        // Boston's partner is null, which the graph has no node for
        let highlights = viewport
            .select(&SelectionEvent::new(ViewKind::RadialBar, "region", vec!["US".into()]))
            .unwrap();

        let graph = viewport.render(ViewKind::ForceDirected).unwrap();
        let nodes: HighlightSet = graph.as_graph().unwrap().nodes.iter().map(|n| n.id.clone()).collect();
        assert_eq!(highlights[&ViewKind::ForceDirected], set(&["Austin", "Boston"]));
        assert!(highlights[&ViewKind::ForceDirected].is_subset(&nodes));

        let chord = viewport.render(ViewKind::Chord).unwrap();
        let entities: HighlightSet = chord.as_matrix().unwrap().entities.iter().cloned().collect();
        assert!(highlights[&ViewKind::Chord].is_subset(&entities));

        let hierarchy = viewport.render(ViewKind::Sunburst).unwrap();
        let top: HighlightSet = hierarchy
            .as_hierarchy()
            .unwrap()
            .children
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert!(highlights[&ViewKind::Sunburst].is_subset(&top));
    }

    #[test]
    fn test_selection_respects_filters() {
        let mut viewport = loaded();
        viewport.set_filter("year", FilterSpec::range(2020.0, 2020.0)).unwrap();
        viewport.apply_filters().unwrap();

        let highlights = viewport
            .select(&SelectionEvent::new(ViewKind::RadialBar, "region", vec!["EU".into()]))
            .unwrap();
        assert_eq!(highlights[&ViewKind::Chord], set(&["Oslo", "Rome"]));
        assert_eq!(highlights[&ViewKind::Sunburst], set(&["EU"]));
    }

    #[test]
    fn test_empty_selection_clears_all_views() {
        let viewport = loaded();
        let highlights = viewport.select(&SelectionEvent::clear(ViewKind::Chord)).unwrap();
        assert_eq!(highlights.len(), ViewKind::ALL.len());
        assert!(highlights.values().all(HighlightSet::is_empty));
    }

    #[test]
    fn test_failed_load_keeps_previous_dataset() {
        let mut viewport = loaded();
        let rejected = Arc::new(Mutex::new(Vec::new()));
        let seen = rejected.clone();
        viewport
            .event_bus()
            .subscribe_fn(move |event: &DatasetRejected| seen.lock().push(event.source_name.clone()));

        assert!(matches!(
            viewport.load_json("bad.json", "[]"),
            Err(DataError::InvalidDataset(_))
        ));
        assert!(viewport.load_json("broken.json", "[{").is_err());

        assert_eq!(viewport.store().map(RecordStore::len), Some(4));
        assert!(viewport.view_settings(ViewKind::RadialBar).is_some());
        assert_eq!(*rejected.lock(), vec!["bad.json".to_string(), "broken.json".to_string()]);
    }

    #[test]
    fn test_reload_discards_settings_and_colors() {
        let mut viewport = loaded();
        let eu = viewport.color_for("EU");
        assert_eq!(viewport.color_for("EU"), eu);

        viewport
            .load_json("other.json", r#"[{"kind": "x", "n": 1}]"#)
            .unwrap();
        assert!(viewport.view_settings(ViewKind::RadialBar).is_none());
        assert!(viewport.color_scale().is_empty());
        assert!(viewport.render(ViewKind::RadialBar).unwrap_err().is_incomplete());
    }

    #[test]
    fn test_without_dataset() {
        let mut viewport = Viewport::default();
        assert!(matches!(viewport.render(ViewKind::Chord), Err(ViewError::NoDataset)));
        assert!(matches!(viewport.apply_filters(), Err(ViewError::NoDataset)));
        let highlights = viewport.select(&SelectionEvent::clear(ViewKind::Sunburst)).unwrap();
        assert!(highlights.values().all(HighlightSet::is_empty));
    }

    #[test]
    fn test_events_published() {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let seen = log.clone();
        bus.subscribe_fn(move |e: &DatasetLoaded| seen.lock().push(format!("loaded {}", e.row_count)));
        let seen = log.clone();
        bus.subscribe_fn(move |e: &FiltersApplied| seen.lock().push(format!("applied {}", e.matched_rows)));
        let seen = log.clone();
        bus.subscribe_fn(move |e: &ViewUnavailable| seen.lock().push(format!("unavailable {}", e.view)));

        let mut viewport = Viewport::with_event_bus(EngineConfig::default(), bus);
        viewport.load_json("sales.json", SALES).unwrap();
        viewport.set_filter("amount", FilterSpec::range(5.0, 10.0)).unwrap();
        viewport.apply_filters().unwrap();
        let _ = viewport.render(ViewKind::Chord);

        assert_eq!(
            *log.lock(),
            vec!["loaded 4".to_string(), "applied 2".to_string(), "unavailable chord".to_string()]
        );
    }

    #[test]
    fn test_csv_load() {
        let mut viewport = Viewport::default();
        let summary = viewport.load_csv("data.csv", "name,score\nann,3\nbob,\n").unwrap();
        assert_eq!(summary.row_count, 2);
        assert!(viewport.dimensions().unwrap().get("score").unwrap().is_numeric());
    }

    #[tokio::test]
    async fn test_load_from_source() {
        let mut viewport = Viewport::default();
        let source = JsonSource::from_text("inline", SALES);
        let summary = viewport.load_from(&source).await.unwrap();
        assert_eq!(summary.source_name, "inline");
        assert_eq!(summary.column_count, 5);
    }
}
