use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Engine-wide event bus.
///
/// Collaborators such as the filter UI subscribe here to learn about loads,
/// filter runs and per-view failures. Cross-view selection does not travel
/// over the bus; it goes through [`crate::sync::SelectionBroker`].
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Common engine events
pub mod events {
    use super::Event;
    use crate::view::ViewKind;

    /// A dataset replaced the previous one
    #[derive(Debug, Clone)]
    pub struct DatasetLoaded {
        pub source_name: String,
        pub row_count: usize,
        pub column_count: usize,
    }

    /// A load attempt failed; the previous dataset is still current
    #[derive(Debug, Clone)]
    pub struct DatasetRejected {
        pub source_name: String,
        pub error: String,
    }

    /// The filtered record set was recomputed
    #[derive(Debug, Clone)]
    pub struct FiltersApplied {
        pub matched_rows: usize,
        pub total_rows: usize,
        pub active_filters: usize,
    }

    /// Every filter was reset to its unrestricted state
    #[derive(Debug, Clone)]
    pub struct FiltersCleared {
        pub total_rows: usize,
    }

    /// A view could not be built and should show a placeholder
    #[derive(Debug, Clone)]
    pub struct ViewUnavailable {
        pub view: ViewKind,
        pub reason: String,
    }

    /// A selection was projected onto the other views
    #[derive(Debug, Clone)]
    pub struct SelectionProjected {
        pub source_view: ViewKind,
        pub resolved_rows: usize,
        pub cleared: bool,
    }

    // Implement Event trait for all event types
    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        DatasetLoaded,
        DatasetRejected,
        FiltersApplied,
        FiltersCleared,
        ViewUnavailable,
        SelectionProjected
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_insert_with(Vec::new).push(handler);
    }

    /// Subscribe a closure that receives the concrete event type
    pub fn subscribe_fn<E, F>(&self, mut f: F)
    where
        E: Event,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(handler_from_fn(move |event: &dyn Event| {
            if let Some(event) = event.as_any().downcast_ref::<E>() {
                f(event);
            }
        }));
    }

    /// Publish an event
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();

        if let Some(event_handlers) = handlers.get_mut(&type_id) {
            tracing::trace!(handlers = event_handlers.len(), "publishing {}", std::any::type_name::<E>());
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}
