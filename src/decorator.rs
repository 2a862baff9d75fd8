//! Payload decoration.
//!
//! A decorator turns a raw physical segment into whatever readable object
//! the application searches with. The composite view stores one payload per
//! segment and hands them back, but never looks inside.

use std::sync::Arc;

use crate::error::Result;
use crate::store::traits::PhysicalSegment;

/// Builds the application payload for a segment.
pub trait PayloadDecorator<P>: Send + Sync + std::fmt::Debug {
    /// Decorate a segment seen for the first time.
    fn decorate(&self, segment: &Arc<dyn PhysicalSegment>) -> Result<P>;

    /// Decorate a segment that replaces a same-named one on reopen.
    ///
    /// The default keeps the previous payload, matching the assumption that
    /// a segment name identifies unchanged content.
    fn redecorate(
        &self,
        previous: &Arc<P>,
        segment: &Arc<dyn PhysicalSegment>,
    ) -> Result<Arc<P>> {
        let _ = segment;
        Ok(Arc::clone(previous))
    }
}

/// Uses the physical segment itself as the payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentDecorator;

impl PayloadDecorator<Arc<dyn PhysicalSegment>> for SegmentDecorator {
    fn decorate(&self, segment: &Arc<dyn PhysicalSegment>) -> Result<Arc<dyn PhysicalSegment>> {
        Ok(Arc::clone(segment))
    }

    fn redecorate(
        &self,
        _previous: &Arc<Arc<dyn PhysicalSegment>>,
        segment: &Arc<dyn PhysicalSegment>,
    ) -> Result<Arc<Arc<dyn PhysicalSegment>>> {
        Ok(Arc::new(Arc::clone(segment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemorySegment;

    #[test]
    fn test_segment_decorator_follows_new_segment() {
        let first: Arc<dyn PhysicalSegment> = Arc::new(MemorySegment::sequential("_0", 0, 2));
        let second: Arc<dyn PhysicalSegment> = Arc::new(MemorySegment::sequential("_0", 5, 4));

        let payload = Arc::new(SegmentDecorator.decorate(&first).unwrap());
        assert_eq!(payload.doc_count(), 2);

        let redecorated = SegmentDecorator.redecorate(&payload, &second).unwrap();
        assert_eq!(redecorated.doc_count(), 4);
        assert_eq!(redecorated.stable_id(0), Some(5));
    }
}
