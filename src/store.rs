//! Segment store abstraction.
//!
//! A composite view never reads segment files itself. It consumes a
//! [`SegmentStore`] that enumerates immutable physical segments, reports
//! whether anything changed since a given version, and is told when the
//! last reader of a generation lets go of it.

pub mod handle;
pub mod memory;
pub mod traits;

pub use handle::StoreHandle;
pub use memory::{MemorySegment, MemorySegmentStore};
pub use traits::{PhysicalSegment, SegmentStore, StoreGeneration, StoreKind, StoreLeaf};
