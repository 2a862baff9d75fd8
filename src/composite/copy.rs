//! Snapshot copies for background work.

use std::sync::Arc;

use crate::composite::view::CompositeView;
use crate::error::Result;
use crate::segment::snapshot::SegmentSnapshot;

impl<P> CompositeView<P> {
    /// Independent view over the same store generation.
    ///
    /// The copy takes its own reference on the generation and shares every
    /// segment and payload with this view. Delete state is forked per
    /// segment: what was committed or staged here at copy time is carried
    /// over, and later marks on either side stay on that side. The stable id
    /// mapper, if any, is carried over as is.
    pub fn copy(&self) -> Result<Arc<Self>> {
        self.check_closed()?;
        self.handle.inc_ref()?;

        let segments = self.segments.iter().map(SegmentSnapshot::copy).collect();
        Ok(Arc::new(CompositeView::from_parts(
            Arc::clone(&self.handle),
            Arc::clone(&self.decorator),
            self.config.clone(),
            segments,
            self.boundaries.clone(),
            self.id_mapper(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::config::CompositeViewConfig;
    use crate::decorator::SegmentDecorator;
    use crate::mapper::PositionTable;
    use crate::store::memory::{MemorySegment, MemorySegmentStore};
    use crate::store::traits::PhysicalSegment;

    type View = CompositeView<Arc<dyn PhysicalSegment>>;

    fn open() -> (Arc<MemorySegmentStore>, Arc<View>) {
        let store = Arc::new(MemorySegmentStore::with_segments(vec![
            MemorySegment::sequential("_0", 0, 3),
            MemorySegment::sequential("_1", 3, 3),
        ]));
        let view = View::open(
            store.clone(),
            Arc::new(SegmentDecorator),
            CompositeViewConfig::default(),
        )
        .unwrap();
        (store, view)
    }

    #[test]
    fn test_copy_takes_a_reference() {
        let (store, view) = open();
        let copy = view.copy().unwrap();
        assert_eq!(view.ref_count(), 2);
        assert_eq!(copy.starts(), view.starts());

        view.close().unwrap();
        assert_eq!(store.release_count(copy.version()), 0);
        assert_eq!(copy.stable_id_at(4).unwrap(), Some(4));

        copy.close().unwrap();
        assert_eq!(store.release_count(copy.version()), 1);
    }

    #[test]
    fn test_copy_shares_payloads() {
        let (_store, view) = open();
        let copy = view.copy().unwrap();
        for (a, b) in view.decorated_payloads().iter().zip(copy.decorated_payloads()) {
            assert!(Arc::ptr_eq(a, &b));
        }
    }

    #[test]
    fn test_copy_carries_id_mapper() {
        let (_store, view) = open();
        let mapper = Arc::new(PositionTable::build(&*view));
        view.set_id_mapper(mapper);

        let copy = view.copy().unwrap();
        let (a, b) = (view.id_mapper().unwrap(), copy.id_mapper().unwrap());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_copy_of_closed_view_fails() {
        let (store, view) = open();
        view.close().unwrap();
        assert!(view.copy().unwrap_err().is_closed());
        assert_eq!(store.total_releases(), 1);
    }
}
