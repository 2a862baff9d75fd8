//! Store abstraction traits and common types.

use std::sync::Arc;

use crate::error::Result;
use crate::types::{LocalOffset, StableId};

/// One immutable segment as exposed by the store.
pub trait PhysicalSegment: Send + Sync + std::fmt::Debug {
    /// Segment name, unique within one store generation.
    fn name(&self) -> &str;

    /// Number of documents in this segment, deleted or not.
    fn doc_count(&self) -> u64;

    /// Optional content token.
    ///
    /// Two segments with the same name and the same token are considered to
    /// hold the same documents. Stores that rewrite segments in place under an
    /// unchanged name should bump it.
    fn version(&self) -> Option<u64> {
        None
    }

    /// Stable id of the document at `local`, or `None` past the end.
    fn stable_id(&self, local: LocalOffset) -> Option<StableId>;

    /// Stored payload bytes for a document of this segment.
    fn stored_value(&self, stable_id: StableId) -> Result<Option<Vec<u8>>>;
}

/// Leaf unit returned by a store enumeration.
#[derive(Debug, Clone)]
pub enum StoreLeaf {
    /// A regular segment.
    Segment(Arc<dyn PhysicalSegment>),
    /// Anything else the store may expose (e.g. a nested composite reader).
    Foreign {
        /// Human readable kind, used in error messages.
        kind: String,
    },
}

impl StoreLeaf {
    /// Wrap a segment.
    pub fn segment<S: PhysicalSegment + 'static>(segment: S) -> Self {
        StoreLeaf::Segment(Arc::new(segment))
    }

    /// Kind name of this leaf.
    pub fn kind_name(&self) -> &str {
        match self {
            StoreLeaf::Segment(_) => "segment",
            StoreLeaf::Foreign { kind } => kind,
        }
    }
}

/// Shape of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// A multi-segment store a composite view can be built over.
    Composite,
    /// A store exposing a single flat reader.
    Single,
}

/// Consistent enumeration of one store generation.
#[derive(Debug, Clone)]
pub struct StoreGeneration {
    /// Version the enumeration was taken at.
    pub version: u64,
    /// Total document count as reported by the store.
    pub doc_count: u64,
    /// Leaves in index order.
    pub leaves: Vec<StoreLeaf>,
}

/// External segment store.
pub trait SegmentStore: Send + Sync + std::fmt::Debug {
    /// Shape of this store.
    fn kind(&self) -> StoreKind;

    /// Current version. Bumped on every change to the segment list.
    fn version(&self) -> u64;

    /// Whether the segment list changed since `version`.
    fn has_changed_since(&self, version: u64) -> bool {
        self.version() != version
    }

    /// Enumerate the current generation.
    fn enumerate(&self) -> Result<StoreGeneration>;

    /// Called exactly once when the last reference to generation `version` is dropped.
    fn release(&self, version: u64);
}
