//! Per-segment snapshots and their delete state.

pub mod deletes;
pub mod snapshot;

pub use deletes::{DeleteState, DeletedDocs};
pub use snapshot::SegmentSnapshot;
