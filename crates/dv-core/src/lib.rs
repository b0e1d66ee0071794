//! Core abstractions for the coordinated-view data engine
//!
//! This crate holds the value model shared by every stage, the view kinds and
//! the roles they declare, the event bus, and the cross-view selection broker.

pub mod events;
pub mod sync;
pub mod value;
pub mod view;

// Re-export commonly used types
pub use events::EventBus;
pub use sync::{
    HighlightMap, HighlightSet, ResolvingDimension, SelectionBroker, SelectionError, SelectionEvent,
};
pub use value::{Record, Value, NULL_TOKEN};
pub use view::{roles, ColumnKind, RoleBinding, RoleSpec, ViewKind, ViewSettings};
