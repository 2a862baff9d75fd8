//! Global position to segment resolution.

use crate::error::{Result, TesseraError};
use crate::types::{GlobalPosition, LocalOffset};

/// Index of the segment holding `position`, given cumulative `starts`.
///
/// `starts` has one entry per segment plus a trailing total, so segment `i`
/// covers `starts[i]..starts[i + 1]`. When `position` sits exactly on a
/// boundary shared by empty segments, the last segment starting there wins,
/// which is the first non-empty one. Positions outside `0..total` have no
/// meaningful answer; callers check the range first.
pub fn segment_index(starts: &[GlobalPosition], position: GlobalPosition) -> usize {
    let num_segments = starts.len().saturating_sub(1);
    let mut lo = 0;
    let mut hi = num_segments;

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let mid_value = starts[mid];
        if position < mid_value {
            hi = mid;
        } else if position > mid_value {
            if position < starts[mid + 1] {
                return mid;
            }
            lo = mid + 1;
        } else {
            // skip empty segments sharing this boundary
            let mut idx = mid;
            while idx + 1 < num_segments && starts[idx + 1] == mid_value {
                idx += 1;
            }
            return idx;
        }
    }

    lo.saturating_sub(1).min(num_segments.saturating_sub(1))
}

/// Cumulative document offsets of an ordered segment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryIndex {
    starts: Vec<GlobalPosition>,
}

impl Default for BoundaryIndex {
    fn default() -> Self {
        BoundaryIndex { starts: vec![0] }
    }
}

impl BoundaryIndex {
    /// Build from per-segment document counts, in segment order.
    ///
    /// Fails with `InvalidArgument` when the total does not fit in a `u64`.
    pub fn from_doc_counts<I: IntoIterator<Item = u64>>(doc_counts: I) -> Result<Self> {
        let mut starts = vec![0];
        let mut total: u64 = 0;
        for count in doc_counts {
            total = total.checked_add(count).ok_or_else(|| {
                TesseraError::invalid_argument(format!(
                    "document count overflows after {} segments",
                    starts.len() - 1
                ))
            })?;
            starts.push(total);
        }
        Ok(BoundaryIndex { starts })
    }

    /// `starts[i]` for every segment followed by the total.
    pub fn starts(&self) -> &[GlobalPosition] {
        &self.starts
    }

    pub fn segment_count(&self) -> usize {
        self.starts.len() - 1
    }

    pub fn total_doc_count(&self) -> u64 {
        self.starts[self.starts.len() - 1]
    }

    /// First global position of segment `segment`.
    pub fn start(&self, segment: usize) -> GlobalPosition {
        self.starts[segment]
    }

    pub fn contains(&self, position: GlobalPosition) -> bool {
        position < self.total_doc_count()
    }

    /// Segment index and local offset of `position`, or `None` when out of range.
    pub fn locate(&self, position: GlobalPosition) -> Option<(usize, LocalOffset)> {
        if !self.contains(position) {
            return None;
        }
        let idx = segment_index(&self.starts, position);
        Some((idx, position - self.starts[idx]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundary_skips_empty_segment() {
        let index = BoundaryIndex::from_doc_counts([5, 0, 3]).unwrap();
        assert_eq!(index.starts(), &[0, 5, 5, 8]);
        assert_eq!(index.locate(5), Some((2, 0)));
        assert_eq!(index.locate(4), Some((0, 4)));
        assert_eq!(index.locate(7), Some((2, 2)));
        assert_eq!(index.locate(8), None);
    }

    #[test]
    fn test_leading_empty_segments() {
        let index = BoundaryIndex::from_doc_counts([0, 0, 2]).unwrap();
        assert_eq!(index.locate(0), Some((2, 0)));
        assert_eq!(index.locate(1), Some((2, 1)));
    }

    #[test]
    fn test_trailing_empty_segments() {
        let index = BoundaryIndex::from_doc_counts([2, 0, 0]).unwrap();
        assert_eq!(index.locate(1), Some((0, 1)));
        assert_eq!(index.locate(2), None);
        assert_eq!(index.total_doc_count(), 2);
    }

    #[test]
    fn test_total_overflow_is_rejected() {
        let err = BoundaryIndex::from_doc_counts([u64::MAX, 1]).unwrap_err();
        assert!(matches!(err, TesseraError::InvalidArgument(_)));
        assert!(BoundaryIndex::from_doc_counts([u64::MAX - 1, 1]).is_ok());
    }

    #[test]
    fn test_empty_index() {
        let index = BoundaryIndex::default();
        assert_eq!(index.segment_count(), 0);
        assert_eq!(index.total_doc_count(), 0);
        assert_eq!(index.locate(0), None);
    }

    proptest! {
        #[test]
        fn prop_locate_matches_linear_scan(sizes in prop::collection::vec(0u64..6, 1..24)) {
            let index = BoundaryIndex::from_doc_counts(sizes.iter().copied()).unwrap();
            let mut position = 0;
            for (segment, &size) in sizes.iter().enumerate() {
                for local in 0..size {
                    prop_assert_eq!(index.locate(position), Some((segment, local)));
                    position += 1;
                }
            }
            prop_assert_eq!(index.total_doc_count(), position);
            prop_assert_eq!(index.locate(position), None);
        }

        #[test]
        fn prop_never_selects_empty_segment(sizes in prop::collection::vec(0u64..4, 1..24)) {
            let index = BoundaryIndex::from_doc_counts(sizes.iter().copied()).unwrap();
            for position in 0..index.total_doc_count() {
                let (segment, _) = index.locate(position).unwrap();
                prop_assert!(sizes[segment] > 0);
            }
        }
    }
}
