//! Live delete tracking for a single segment.
//!
//! Deletes are staged into a pending bitmap and published with a single
//! pointer swap on commit, so a reader sees either the whole previous set or
//! the whole new one.

use std::sync::Arc;

use arc_swap::ArcSwap;
use bit_vec::BitVec;
use parking_lot::Mutex;

use crate::types::LocalOffset;

/// Immutable set of deleted local offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedDocs {
    bits: BitVec,
    count: u64,
}

impl DeletedDocs {
    /// Empty set for a segment of `doc_count` documents.
    pub fn empty(doc_count: u64) -> Self {
        DeletedDocs {
            bits: BitVec::from_elem(doc_count as usize, false),
            count: 0,
        }
    }

    /// Whether `local` is deleted. Out-of-range offsets are never deleted.
    pub fn contains(&self, local: LocalOffset) -> bool {
        self.bits.get(local as usize).unwrap_or(false)
    }

    /// Number of deleted documents.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Capacity in documents.
    pub fn len(&self) -> u64 {
        self.bits.len() as u64
    }

    /// Whether the set covers no documents at all.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Deleted offsets in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = LocalOffset> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, bit)| bit.then_some(i as LocalOffset))
    }

    fn insert(&mut self, local: LocalOffset) -> bool {
        if local >= self.len() || self.contains(local) {
            return false;
        }
        self.bits.set(local as usize, true);
        self.count += 1;
        true
    }

    /// Copy resized to `doc_count`; new slots are live, offsets past the end are dropped.
    pub fn resized(&self, doc_count: u64) -> Self {
        let mut bits = self.bits.clone();
        let target = doc_count as usize;
        if target < bits.len() {
            bits.truncate(target);
        } else {
            bits.grow(target - bits.len(), false);
        }
        let count = bits.iter().filter(|bit| *bit).count() as u64;
        DeletedDocs { bits, count }
    }
}

/// Committed and pending delete sets of one segment snapshot.
#[derive(Debug)]
pub struct DeleteState {
    committed: ArcSwap<DeletedDocs>,
    pending: Mutex<Option<DeletedDocs>>,
}

impl DeleteState {
    /// No deletes for a segment of `doc_count` documents.
    pub fn new(doc_count: u64) -> Self {
        Self::from_committed(Arc::new(DeletedDocs::empty(doc_count)))
    }

    fn from_committed(committed: Arc<DeletedDocs>) -> Self {
        DeleteState {
            committed: ArcSwap::new(committed),
            pending: Mutex::new(None),
        }
    }

    /// Committed deletion check. Never blocks.
    pub fn is_deleted(&self, local: LocalOffset) -> bool {
        self.committed.load().contains(local)
    }

    /// Currently published delete set.
    pub fn committed(&self) -> Arc<DeletedDocs> {
        self.committed.load_full()
    }

    /// Whether marks are waiting for a commit.
    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Stage a delete. Returns `true` if it was not already staged or committed.
    pub fn mark(&self, local: LocalOffset) -> bool {
        self.mark_all(std::iter::once(local)) == 1
    }

    /// Stage several deletes under one lock. Returns how many were new.
    pub fn mark_all<I: IntoIterator<Item = LocalOffset>>(&self, locals: I) -> usize {
        let mut pending = self.pending.lock();
        let mut staged = None;
        let mut added = 0;
        for local in locals {
            let set = match pending.as_mut() {
                Some(set) => set,
                None => staged.get_or_insert_with(|| DeletedDocs::clone(&self.committed.load())),
            };
            if set.insert(local) {
                added += 1;
            }
        }
        if added > 0
            && let Some(set) = staged
        {
            *pending = Some(set);
        }
        added
    }

    /// Publish staged deletes. Returns `false` when nothing was pending.
    pub fn commit(&self) -> bool {
        let mut pending = self.pending.lock();
        match pending.take() {
            Some(set) => {
                self.committed.store(Arc::new(set));
                true
            }
            None => false,
        }
    }

    /// Independent state starting from the same committed and pending sets.
    pub fn fork(&self) -> Self {
        let pending = self.pending.lock();
        DeleteState {
            committed: ArcSwap::new(self.committed.load_full()),
            pending: Mutex::new(pending.clone()),
        }
    }

    /// Independent state carried over to a segment of `doc_count` documents.
    pub fn rebase(&self, doc_count: u64) -> Self {
        let pending = self.pending.lock();
        let committed = self.committed.load();
        let committed = if committed.len() == doc_count {
            self.committed.load_full()
        } else {
            Arc::new(committed.resized(doc_count))
        };
        DeleteState {
            committed: ArcSwap::new(committed),
            pending: Mutex::new((*pending).as_ref().map(|set| set.resized(doc_count))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_are_invisible_until_commit() {
        let state = DeleteState::new(10);
        assert!(state.mark(3));
        assert!(!state.mark(3));
        assert!(!state.is_deleted(3));
        assert!(state.has_pending());

        assert!(state.commit());
        assert!(state.is_deleted(3));
        assert!(!state.has_pending());
        assert!(!state.commit());
    }

    #[test]
    fn test_mark_committed_doc_is_noop() {
        let state = DeleteState::new(4);
        state.mark(1);
        state.commit();

        assert!(!state.mark(1));
        assert!(!state.has_pending());
    }

    #[test]
    fn test_out_of_range_mark_is_ignored() {
        let state = DeleteState::new(2);
        assert!(!state.mark(2));
        assert!(!state.is_deleted(2));
        assert_eq!(state.committed().count(), 0);
    }

    #[test]
    fn test_fork_isolates_later_marks() {
        let state = DeleteState::new(5);
        state.mark(0);
        state.commit();
        state.mark(1);

        let fork = state.fork();
        assert!(fork.is_deleted(0));
        assert!(fork.has_pending());

        state.mark(2);
        state.commit();
        assert!(!fork.is_deleted(2));

        fork.mark(4);
        fork.commit();
        assert!(fork.is_deleted(1));
        assert!(fork.is_deleted(4));
        assert!(!state.is_deleted(4));
    }

    #[test]
    fn test_rebase_resizes() {
        let state = DeleteState::new(4);
        state.mark_all([1, 3]);
        state.commit();

        let shrunk = state.rebase(2);
        assert!(shrunk.is_deleted(1));
        assert!(!shrunk.is_deleted(3));
        assert_eq!(shrunk.committed().count(), 1);

        let grown = state.rebase(8);
        assert_eq!(grown.committed().count(), 2);
        assert_eq!(grown.committed().iter().collect::<Vec<_>>(), vec![1, 3]);
        assert!(grown.mark(7));
    }
}
