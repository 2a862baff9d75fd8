//! Composite views over segmented stores.
//!
//! - [`boundary`]: global position to segment resolution
//! - [`view`]: the composite view and its whole-index operations
//! - [`reopen`]: refresh against the store, reusing snapshots by name
//! - [`copy`]: reference-counted snapshot copies
//! - [`config`]: view configuration

pub mod boundary;
pub mod config;
pub mod copy;
pub mod reopen;
pub mod view;

pub use boundary::{BoundaryIndex, segment_index};
pub use config::{CompositeViewConfig, SegmentReusePolicy};
pub use reopen::{ReuseStats, reuse_snapshots};
pub use view::CompositeView;
