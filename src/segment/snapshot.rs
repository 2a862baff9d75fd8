//! Point-in-time wrapper around one physical segment.

use std::fmt;
use std::sync::Arc;

use ahash::AHashSet;

use crate::decorator::PayloadDecorator;
use crate::error::Result;
use crate::segment::deletes::{DeleteState, DeletedDocs};
use crate::store::traits::PhysicalSegment;
use crate::types::{LocalOffset, StableId};

/// A segment as seen by one composite view.
///
/// The physical segment and the decorated payload are shared and immutable.
/// The delete state belongs to this snapshot alone: copies and rebased
/// snapshots start from the same sets but evolve independently.
pub struct SegmentSnapshot<P> {
    segment: Arc<dyn PhysicalSegment>,
    payload: Arc<P>,
    deletes: DeleteState,
}

impl<P> fmt::Debug for SegmentSnapshot<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentSnapshot")
            .field("name", &self.name())
            .field("doc_count", &self.local_doc_count())
            .field("deleted", &self.deleted_count())
            .finish()
    }
}

impl<P> SegmentSnapshot<P> {
    /// Wrap a segment seen for the first time, with no deletes.
    pub fn open(
        segment: Arc<dyn PhysicalSegment>,
        decorator: &dyn PayloadDecorator<P>,
    ) -> Result<Self> {
        let payload = Arc::new(decorator.decorate(&segment)?);
        let deletes = DeleteState::new(segment.doc_count());
        Ok(SegmentSnapshot {
            segment,
            payload,
            deletes,
        })
    }

    /// Carry this snapshot's delete state over to a freshly enumerated
    /// segment of the same name.
    ///
    /// The name is taken as proof that the content is unchanged. If the store
    /// rewrote the segment in place, the inherited deletes are stale.
    pub fn rebase(
        &self,
        segment: Arc<dyn PhysicalSegment>,
        decorator: &dyn PayloadDecorator<P>,
    ) -> Result<Self> {
        let payload = decorator.redecorate(&self.payload, &segment)?;
        let deletes = self.deletes.rebase(segment.doc_count());
        Ok(SegmentSnapshot {
            segment,
            payload,
            deletes,
        })
    }

    /// Shallow copy sharing the segment and payload, with its own delete state.
    pub fn copy(&self) -> Self {
        SegmentSnapshot {
            segment: Arc::clone(&self.segment),
            payload: Arc::clone(&self.payload),
            deletes: self.deletes.fork(),
        }
    }

    pub fn name(&self) -> &str {
        self.segment.name()
    }

    pub fn local_doc_count(&self) -> u64 {
        self.segment.doc_count()
    }

    /// Content token of the underlying segment.
    pub fn version(&self) -> Option<u64> {
        self.segment.version()
    }

    pub fn segment(&self) -> &Arc<dyn PhysicalSegment> {
        &self.segment
    }

    pub fn payload(&self) -> &Arc<P> {
        &self.payload
    }

    /// Committed deletion check.
    pub fn is_deleted(&self, local: LocalOffset) -> bool {
        self.deletes.is_deleted(local)
    }

    /// Stage a delete by local offset.
    pub fn mark_deleted(&self, local: LocalOffset) -> bool {
        self.deletes.mark(local)
    }

    /// Stage deletes for every document of this segment whose stable id is in `ids`.
    ///
    /// Returns how many documents were newly staged.
    pub fn mark_deletes(&self, ids: &AHashSet<StableId>) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let matches = (0..self.local_doc_count()).filter(|&local| {
            self.segment
                .stable_id(local)
                .is_some_and(|id| ids.contains(&id))
        });
        self.deletes.mark_all(matches)
    }

    /// Stage several local offsets at once.
    pub fn mark_deleted_all<I: IntoIterator<Item = LocalOffset>>(&self, locals: I) -> usize {
        self.deletes.mark_all(locals)
    }

    /// Publish staged deletes.
    pub fn commit_deletes(&self) -> bool {
        self.deletes.commit()
    }

    pub fn has_pending_deletes(&self) -> bool {
        self.deletes.has_pending()
    }

    /// Committed delete set.
    pub fn deleted_docs(&self) -> Arc<DeletedDocs> {
        self.deletes.committed()
    }

    pub fn deleted_count(&self) -> u64 {
        self.deletes.committed().count()
    }

    pub fn live_doc_count(&self) -> u64 {
        self.local_doc_count().saturating_sub(self.deleted_count())
    }

    pub fn stable_id_at(&self, local: LocalOffset) -> Option<StableId> {
        if local >= self.local_doc_count() {
            return None;
        }
        self.segment.stable_id(local)
    }

    /// Stored payload bytes for `stable_id`, if this segment holds it.
    pub fn stored_value(&self, stable_id: StableId) -> Result<Option<Vec<u8>>> {
        self.segment.stored_value(stable_id)
    }
}
