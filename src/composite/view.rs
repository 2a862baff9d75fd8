//! The composite view: many segments presented as one document space.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ahash::{AHashMap, AHashSet};
use parking_lot::Mutex;

use crate::composite::boundary::BoundaryIndex;
use crate::composite::config::CompositeViewConfig;
use crate::composite::reopen::open_generation;
use crate::decorator::PayloadDecorator;
use crate::error::{Result, TesseraError};
use crate::mapper::StableIdMapper;
use crate::segment::snapshot::SegmentSnapshot;
use crate::store::handle::StoreHandle;
use crate::store::traits::SegmentStore;
use crate::types::{GlobalPosition, LocalOffset, StableId};

/// A frozen, globally addressable view over one store generation.
///
/// Segments are ordered as the store enumerated them, and global positions
/// are assigned by concatenating their local offsets. The segment list and
/// boundary table never change after construction; only per-segment delete
/// state moves, through [`mark_deletes`](Self::mark_deletes) and
/// [`commit_deletes`](Self::commit_deletes).
///
/// Each view owns one reference on its store generation. [`close`](Self::close)
/// gives it back, and so does dropping an unclosed view.
pub struct CompositeView<P> {
    pub(super) handle: Arc<StoreHandle>,
    pub(super) decorator: Arc<dyn PayloadDecorator<P>>,
    pub(super) config: CompositeViewConfig,
    pub(super) segments: Vec<SegmentSnapshot<P>>,
    by_name: AHashMap<String, usize>,
    pub(super) boundaries: BoundaryIndex,
    id_mapper: Mutex<Option<Arc<dyn StableIdMapper>>>,
    closed: AtomicBool,
}

impl<P> fmt::Debug for CompositeView<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeView")
            .field("version", &self.version())
            .field("segments", &self.segments)
            .field("starts", &self.starts())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<P> CompositeView<P> {
    /// Open a view over the current generation of `store`.
    ///
    /// Fails with `InvalidState` when the store is not a multi-segment store
    /// or enumerates a leaf that is not a segment.
    pub fn open(
        store: Arc<dyn SegmentStore>,
        decorator: Arc<dyn PayloadDecorator<P>>,
        config: CompositeViewConfig,
    ) -> Result<Arc<Self>> {
        let (view, _) = open_generation(&store, &AHashMap::new(), decorator, config)?;
        Ok(Arc::new(view))
    }

    pub(super) fn from_parts(
        handle: Arc<StoreHandle>,
        decorator: Arc<dyn PayloadDecorator<P>>,
        config: CompositeViewConfig,
        segments: Vec<SegmentSnapshot<P>>,
        boundaries: BoundaryIndex,
        id_mapper: Option<Arc<dyn StableIdMapper>>,
    ) -> Self {
        let by_name = segments
            .iter()
            .enumerate()
            .map(|(i, snapshot)| (snapshot.name().to_string(), i))
            .collect();
        CompositeView {
            handle,
            decorator,
            config,
            segments,
            by_name,
            boundaries,
            id_mapper: Mutex::new(id_mapper),
            closed: AtomicBool::new(false),
        }
    }

    /// Fails once this view is closed or its generation has been released
    /// through unmatched [`dec_ref`](Self::dec_ref) calls.
    pub(super) fn check_closed(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(TesseraError::closed("composite view is closed"))
        } else if self.handle.is_released() {
            Err(TesseraError::closed(format!(
                "store generation {} was released",
                self.handle.version()
            )))
        } else {
            Ok(())
        }
    }

    /// Whether this view was closed or its generation released.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.handle.is_released()
    }

    pub fn config(&self) -> &CompositeViewConfig {
        &self.config
    }

    /// Store version this view was built from.
    pub fn version(&self) -> u64 {
        self.handle.version()
    }

    /// Outstanding references on this view's store generation.
    pub fn ref_count(&self) -> usize {
        self.handle.ref_count()
    }

    pub fn total_doc_count(&self) -> u64 {
        self.boundaries.total_doc_count()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Cumulative offsets: one entry per segment plus the total.
    pub fn starts(&self) -> &[GlobalPosition] {
        self.boundaries.starts()
    }

    /// Segment snapshots in global order.
    pub fn segments(&self) -> &[SegmentSnapshot<P>] {
        &self.segments
    }

    pub fn segment_by_name(&self, name: &str) -> Option<&SegmentSnapshot<P>> {
        self.by_name.get(name).map(|&i| &self.segments[i])
    }

    /// Name-keyed table of this view's snapshots, as consumed by reopen.
    pub fn snapshot_table(&self) -> AHashMap<&str, &SegmentSnapshot<P>> {
        self.segments
            .iter()
            .map(|snapshot| (snapshot.name(), snapshot))
            .collect()
    }

    /// Decorated payload of every segment, in global order.
    pub fn decorated_payloads(&self) -> Vec<Arc<P>> {
        self.segments
            .iter()
            .map(|snapshot| Arc::clone(snapshot.payload()))
            .collect()
    }

    /// Segment index and local offset of `position`, or `None` when out of range.
    pub fn global_position_to_segment(
        &self,
        position: GlobalPosition,
    ) -> Option<(usize, LocalOffset)> {
        self.boundaries.locate(position)
    }

    pub fn stable_id_at(&self, position: GlobalPosition) -> Result<Option<StableId>> {
        self.check_closed()?;
        Ok(self
            .global_position_to_segment(position)
            .and_then(|(idx, local)| self.segments[idx].stable_id_at(local)))
    }

    /// Committed deletion check. Out-of-range positions are not deleted.
    pub fn is_deleted(&self, position: GlobalPosition) -> Result<bool> {
        self.check_closed()?;
        Ok(self
            .global_position_to_segment(position)
            .is_some_and(|(idx, local)| self.segments[idx].is_deleted(local)))
    }

    /// Stored payload bytes of the document currently known as `stable_id`.
    ///
    /// Returns `None` when no id mapper is installed, the mapper has no
    /// position for the id, or the position falls outside this view.
    pub fn stored_value(&self, stable_id: StableId) -> Result<Option<Vec<u8>>> {
        self.check_closed()?;
        let Some(mapper) = self.id_mapper() else {
            return Ok(None);
        };
        let Some(position) = mapper.position(stable_id) else {
            return Ok(None);
        };
        match self.global_position_to_segment(position) {
            Some((idx, _)) => self.segments[idx].stored_value(stable_id),
            None => Ok(None),
        }
    }

    /// Stage deletes for the given stable ids in every segment.
    ///
    /// Each segment receives the whole set and matches it against its own
    /// documents. Nothing is visible until [`commit_deletes`](Self::commit_deletes).
    pub fn mark_deletes(&self, stable_ids: &AHashSet<StableId>) -> Result<usize> {
        self.check_closed()?;
        Ok(self
            .segments
            .iter()
            .map(|snapshot| snapshot.mark_deletes(stable_ids))
            .sum())
    }

    /// Stage deletes by global position. Out-of-range positions are ignored.
    pub fn mark_deletes_at(&self, positions: &[GlobalPosition]) -> Result<usize> {
        self.check_closed()?;
        let mut per_segment: Vec<Vec<LocalOffset>> = vec![Vec::new(); self.segments.len()];
        for &position in positions {
            if let Some((idx, local)) = self.global_position_to_segment(position) {
                per_segment[idx].push(local);
            }
        }
        Ok(self
            .segments
            .iter()
            .zip(per_segment)
            .map(|(snapshot, locals)| snapshot.mark_deleted_all(locals))
            .sum())
    }

    /// Publish staged deletes in every segment.
    pub fn commit_deletes(&self) -> Result<()> {
        self.check_closed()?;
        for snapshot in &self.segments {
            snapshot.commit_deletes();
        }
        Ok(())
    }

    pub fn deleted_doc_count(&self) -> u64 {
        self.segments.iter().map(|s| s.deleted_count()).sum()
    }

    pub fn live_doc_count(&self) -> u64 {
        self.total_doc_count().saturating_sub(self.deleted_doc_count())
    }

    /// Install the stable id to position lookup used by [`stored_value`](Self::stored_value).
    pub fn set_id_mapper(&self, mapper: Arc<dyn StableIdMapper>) {
        *self.id_mapper.lock() = Some(mapper);
    }

    pub fn id_mapper(&self) -> Option<Arc<dyn StableIdMapper>> {
        self.id_mapper.lock().clone()
    }

    /// Take an extra reference on the store generation.
    pub fn inc_ref(&self) -> Result<()> {
        self.check_closed()?;
        self.handle.inc_ref()
    }

    /// Give back a reference taken with [`inc_ref`](Self::inc_ref).
    pub fn dec_ref(&self) -> Result<()> {
        self.handle.dec_ref()
    }

    /// Give back this view's own reference. Further calls are no-ops.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.handle.dec_ref()
    }
}

impl<P> Drop for CompositeView<P> {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.handle.dec_ref();
        }
    }
}
