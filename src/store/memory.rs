//! In-memory segment store for testing and tooling.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::error::{Result, TesseraError};
use crate::store::traits::{PhysicalSegment, SegmentStore, StoreGeneration, StoreKind, StoreLeaf};
use crate::types::{LocalOffset, StableId};

/// An immutable in-memory segment.
#[derive(Debug, Clone)]
pub struct MemorySegment {
    name: String,
    version: Option<u64>,
    stable_ids: Vec<StableId>,
    values: AHashMap<StableId, Vec<u8>>,
}

impl MemorySegment {
    /// Create a segment holding the given stable ids, without stored values.
    pub fn new<S: Into<String>>(name: S, stable_ids: Vec<StableId>) -> Self {
        MemorySegment {
            name: name.into(),
            version: None,
            stable_ids,
            values: AHashMap::new(),
        }
    }

    /// Create a segment from `(stable_id, stored value)` pairs.
    pub fn with_values<S: Into<String>>(name: S, docs: Vec<(StableId, Vec<u8>)>) -> Self {
        let mut stable_ids = Vec::with_capacity(docs.len());
        let mut values = AHashMap::with_capacity(docs.len());
        for (id, value) in docs {
            stable_ids.push(id);
            values.insert(id, value);
        }
        MemorySegment {
            name: name.into(),
            version: None,
            stable_ids,
            values,
        }
    }

    /// Segment of `doc_count` documents whose stable ids start at `first_id`.
    pub fn sequential<S: Into<String>>(name: S, first_id: StableId, doc_count: u64) -> Self {
        Self::new(name, (first_id..first_id + doc_count).collect())
    }

    /// Set the content token.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }
}

impl PhysicalSegment for MemorySegment {
    fn name(&self) -> &str {
        &self.name
    }

    fn doc_count(&self) -> u64 {
        self.stable_ids.len() as u64
    }

    fn version(&self) -> Option<u64> {
        self.version
    }

    fn stable_id(&self, local: LocalOffset) -> Option<StableId> {
        self.stable_ids.get(local as usize).copied()
    }

    fn stored_value(&self, stable_id: StableId) -> Result<Option<Vec<u8>>> {
        Ok(self.values.get(&stable_id).cloned())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    version: u64,
    leaves: Vec<StoreLeaf>,
    reported_doc_count: Option<u64>,
}

impl MemoryState {
    fn position(&self, name: &str) -> Option<usize> {
        self.leaves.iter().position(|leaf| match leaf {
            StoreLeaf::Segment(segment) => segment.name() == name,
            StoreLeaf::Foreign { .. } => false,
        })
    }
}

/// A mutable in-memory segment list.
///
/// Every mutation bumps the version, so readers opened earlier see the
/// change on their next reopen. Releases are counted per version.
#[derive(Debug)]
pub struct MemorySegmentStore {
    kind: StoreKind,
    state: Mutex<MemoryState>,
    releases: Mutex<AHashMap<u64, usize>>,
}

impl Default for MemorySegmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySegmentStore {
    /// Create an empty composite store.
    pub fn new() -> Self {
        Self::with_kind(StoreKind::Composite)
    }

    /// Create an empty store of the given kind.
    pub fn with_kind(kind: StoreKind) -> Self {
        MemorySegmentStore {
            kind,
            state: Mutex::new(MemoryState::default()),
            releases: Mutex::new(AHashMap::new()),
        }
    }

    /// Create a composite store holding `segments` in order.
    pub fn with_segments(segments: Vec<MemorySegment>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock();
            state.leaves = segments.into_iter().map(StoreLeaf::segment).collect();
            state.version = 1;
        }
        store
    }

    /// Append a segment. Returns the new version.
    pub fn add_segment(&self, segment: MemorySegment) -> u64 {
        self.push_leaf(StoreLeaf::segment(segment))
    }

    /// Append a leaf of some other kind. Returns the new version.
    pub fn add_foreign<S: Into<String>>(&self, kind: S) -> u64 {
        self.push_leaf(StoreLeaf::Foreign { kind: kind.into() })
    }

    fn push_leaf(&self, leaf: StoreLeaf) -> u64 {
        let mut state = self.state.lock();
        state.leaves.push(leaf);
        state.version += 1;
        state.version
    }

    /// Remove a segment by name.
    pub fn remove_segment(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        match state.position(name) {
            Some(pos) => {
                state.leaves.remove(pos);
                state.version += 1;
                true
            }
            None => false,
        }
    }

    /// Swap the segment with the same name for `segment`, keeping its position.
    pub fn replace_segment(&self, segment: MemorySegment) -> bool {
        let mut state = self.state.lock();
        match state.position(&segment.name) {
            Some(pos) => {
                state.leaves[pos] = StoreLeaf::segment(segment);
                state.version += 1;
                true
            }
            None => false,
        }
    }

    /// Merge the named segments into one segment called `merged_name`.
    ///
    /// The merged segment takes the place of the first source segment and
    /// holds the sources' documents in source order.
    pub fn merge_segments(&self, names: &[&str], merged_name: &str) -> Result<()> {
        let mut state = self.state.lock();
        let mut positions = Vec::with_capacity(names.len());
        for name in names {
            let pos = state
                .position(name)
                .ok_or_else(|| TesseraError::store(format!("segment {name} not found")))?;
            positions.push(pos);
        }
        positions.sort_unstable();
        positions.dedup();
        let Some(&first) = positions.first() else {
            return Err(TesseraError::invalid_argument("nothing to merge"));
        };

        let mut docs = Vec::new();
        for &pos in &positions {
            if let StoreLeaf::Segment(segment) = &state.leaves[pos] {
                for local in 0..segment.doc_count() {
                    if let Some(id) = segment.stable_id(local) {
                        let value = segment.stored_value(id)?.unwrap_or_default();
                        docs.push((id, value));
                    }
                }
            }
        }

        let merged = StoreLeaf::segment(MemorySegment::with_values(merged_name, docs));
        for &pos in positions.iter().rev() {
            state.leaves.remove(pos);
        }
        state.leaves.insert(first, merged);
        state.version += 1;
        Ok(())
    }

    /// Make `enumerate` report `total` instead of the leaves' sum, as a store
    /// with a stale or corrupt header would. `None` restores the real sum.
    /// Returns the new version.
    pub fn report_doc_count(&self, total: Option<u64>) -> u64 {
        let mut state = self.state.lock();
        state.reported_doc_count = total;
        state.version += 1;
        state.version
    }

    /// Number of segments currently listed.
    pub fn segment_count(&self) -> usize {
        self.state.lock().leaves.len()
    }

    /// How often generation `version` was released.
    pub fn release_count(&self, version: u64) -> usize {
        self.releases.lock().get(&version).copied().unwrap_or(0)
    }

    /// Total releases across all generations.
    pub fn total_releases(&self) -> usize {
        self.releases.lock().values().sum()
    }
}

impl SegmentStore for MemorySegmentStore {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    fn version(&self) -> u64 {
        self.state.lock().version
    }

    fn enumerate(&self) -> Result<StoreGeneration> {
        let state = self.state.lock();
        let doc_count = state.reported_doc_count.unwrap_or_else(|| {
            state
                .leaves
                .iter()
                .map(|leaf| match leaf {
                    StoreLeaf::Segment(segment) => segment.doc_count(),
                    StoreLeaf::Foreign { .. } => 0,
                })
                .sum()
        });
        Ok(StoreGeneration {
            version: state.version,
            doc_count,
            leaves: state.leaves.clone(),
        })
    }

    fn release(&self, version: u64) {
        *self.releases.lock().entry(version).or_insert(0) += 1;
    }
}

/// Shared constructor used by the CLI and benches: one segment per size.
pub fn store_from_sizes(sizes: &[u64]) -> Arc<MemorySegmentStore> {
    let mut next_id = 0;
    let segments = sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            let segment = MemorySegment::sequential(format!("_{i}"), next_id, size);
            next_id += size;
            segment
        })
        .collect();
    Arc::new(MemorySegmentStore::with_segments(segments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_doc_count_override() {
        let store = MemorySegmentStore::with_segments(vec![MemorySegment::sequential("_0", 0, 3)]);
        assert_eq!(store.enumerate().unwrap().doc_count, 3);

        assert_eq!(store.report_doc_count(Some(10)), 2);
        assert_eq!(store.enumerate().unwrap().doc_count, 10);

        store.report_doc_count(None);
        assert_eq!(store.enumerate().unwrap().doc_count, 3);
    }

    #[test]
    fn test_mutations_bump_version() {
        let store = MemorySegmentStore::new();
        assert_eq!(store.version(), 0);

        store.add_segment(MemorySegment::sequential("_0", 0, 3));
        assert_eq!(store.version(), 1);
        assert!(store.has_changed_since(0));
        assert!(!store.has_changed_since(1));

        assert!(store.replace_segment(MemorySegment::sequential("_0", 10, 3)));
        assert_eq!(store.version(), 2);

        assert!(!store.remove_segment("_missing"));
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_merge_keeps_documents_in_order() {
        let store = MemorySegmentStore::with_segments(vec![
            MemorySegment::with_values("_0", vec![(1, b"a".to_vec())]),
            MemorySegment::with_values("_1", vec![(2, b"b".to_vec())]),
            MemorySegment::with_values("_2", vec![(3, b"c".to_vec())]),
        ]);

        store.merge_segments(&["_0", "_1"], "_3").unwrap();
        let generation = store.enumerate().unwrap();
        assert_eq!(generation.doc_count, 3);

        let names: Vec<_> = generation
            .leaves
            .iter()
            .map(|leaf| match leaf {
                StoreLeaf::Segment(s) => s.name().to_string(),
                StoreLeaf::Foreign { kind } => kind.clone(),
            })
            .collect();
        assert_eq!(names, vec!["_3", "_2"]);

        if let StoreLeaf::Segment(merged) = &generation.leaves[0] {
            assert_eq!(merged.stable_id(1), Some(2));
            assert_eq!(merged.stored_value(2).unwrap(), Some(b"b".to_vec()));
        } else {
            panic!("expected merged segment");
        }
    }

    #[test]
    fn test_merge_unknown_segment_fails() {
        let store = MemorySegmentStore::with_segments(vec![MemorySegment::sequential("_0", 0, 1)]);
        assert!(store.merge_segments(&["_0", "_9"], "_1").is_err());
        assert_eq!(store.segment_count(), 1);
    }

    #[test]
    fn test_store_from_sizes() {
        let store = store_from_sizes(&[2, 0, 3]);
        let generation = store.enumerate().unwrap();
        assert_eq!(generation.leaves.len(), 3);
        assert_eq!(generation.doc_count, 5);
    }
}
