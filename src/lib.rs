//! # Tessera
//!
//! Read-side composition and refresh for segment-structured search indexes.
//!
//! A [`CompositeView`](composite::CompositeView) presents the immutable
//! segments of a store as one globally addressable document space. It can be
//! reopened when the store changes, reusing the snapshots of segments it
//! already knows, and copied for background work without disturbing readers
//! that hold the original.
//!
//! ## Features
//!
//! - Binary-search resolution of global positions to segments
//! - Reopen that returns the same view when nothing changed
//! - Reference-counted snapshot copies over one store generation
//! - Staged live deletes published with a single atomic swap
//! - Pluggable segment stores, payload decorators and stable id mappers

pub mod cli;
pub mod composite;
pub mod decorator;
pub mod error;
pub mod mapper;
pub mod segment;
pub mod store;
pub mod types;

pub mod prelude {
    pub use crate::composite::{CompositeView, CompositeViewConfig, SegmentReusePolicy};
    pub use crate::decorator::{PayloadDecorator, SegmentDecorator};
    pub use crate::error::{Result, TesseraError};
    pub use crate::mapper::{PositionTable, StableIdMapper};
    pub use crate::segment::SegmentSnapshot;
    pub use crate::store::{PhysicalSegment, SegmentStore, StoreKind, StoreLeaf};
    pub use crate::types::{GlobalPosition, LocalOffset, StableId};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
