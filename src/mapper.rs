//! Stable id to global position lookup.
//!
//! Views never maintain this mapping on their own; callers install a
//! [`StableIdMapper`] that is already valid for the view's generation.

use ahash::AHashMap;

use crate::composite::view::CompositeView;
use crate::types::{GlobalPosition, StableId};

/// Resolves a stable id to its current global position.
pub trait StableIdMapper: Send + Sync + std::fmt::Debug {
    /// Current position of `stable_id`, or `None` if it has none.
    fn position(&self, stable_id: StableId) -> Option<GlobalPosition>;
}

/// Hash table mapper built from one view generation.
#[derive(Debug, Clone, Default)]
pub struct PositionTable {
    positions: AHashMap<StableId, GlobalPosition>,
}

impl PositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every live document of `view`.
    ///
    /// Deleted documents are skipped. If the same stable id appears more than
    /// once, the lowest position wins.
    pub fn build<P>(view: &CompositeView<P>) -> Self {
        let mut positions = AHashMap::with_capacity(view.live_doc_count() as usize);
        for (snapshot, &start) in view.segments().iter().zip(view.starts()) {
            let deleted = snapshot.deleted_docs();
            for local in 0..snapshot.local_doc_count() {
                if deleted.contains(local) {
                    continue;
                }
                if let Some(id) = snapshot.stable_id_at(local) {
                    positions.entry(id).or_insert(start + local);
                }
            }
        }
        PositionTable { positions }
    }

    pub fn insert(&mut self, stable_id: StableId, position: GlobalPosition) {
        self.positions.insert(stable_id, position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl StableIdMapper for PositionTable {
    fn position(&self, stable_id: StableId) -> Option<GlobalPosition> {
        self.positions.get(&stable_id).copied()
    }
}
