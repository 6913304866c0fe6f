//! In-memory element tree the detection and fill engine runs against.
//!
//! The tree is owned by the caller. Everything the engine keeps about a node
//! is a [`NodeId`], a generational handle that goes stale when the page
//! removes the node.

pub mod document;
pub mod geometry;
pub mod selector;
pub mod snapshot;

pub use document::{
    Document, DomError, DomEvent, Element, EventKind, MutationRecord, NodeId, ObserverId,
    SharedDocument, Style,
};
pub use geometry::{Rect, Viewport};
pub use selector::Selector;
pub use snapshot::{ElementSnapshot, NodeSnapshot, PageSnapshot};
