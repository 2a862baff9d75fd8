//! Reopen: refresh a view against the store while reusing what it can.
//!
//! Reopen never touches the view it is called on. It either returns that
//! same view (nothing changed) or builds a new one over the store's current
//! generation, rebasing snapshots whose segment name it already knows and
//! opening fresh ones for everything else.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::AHashMap;
use log::{debug, info};

use crate::composite::boundary::BoundaryIndex;
use crate::composite::config::{CompositeViewConfig, SegmentReusePolicy};
use crate::composite::view::CompositeView;
use crate::decorator::PayloadDecorator;
use crate::error::{Result, TesseraError};
use crate::segment::snapshot::SegmentSnapshot;
use crate::store::handle::StoreHandle;
use crate::store::traits::{PhysicalSegment, SegmentStore, StoreKind, StoreLeaf};

/// Counts of snapshots carried over and opened fresh by one reopen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReuseStats {
    pub reused: usize,
    pub created: usize,
}

impl SegmentReusePolicy {
    /// Whether `previous` may be rebased onto `segment`. Names already match.
    pub fn accepts<P>(&self, previous: &SegmentSnapshot<P>, segment: &dyn PhysicalSegment) -> bool {
        match self {
            SegmentReusePolicy::ByName => true,
            SegmentReusePolicy::ByNameAndVersion => {
                previous.version().is_some() && previous.version() == segment.version()
            }
        }
    }
}

/// Build the snapshot list for a new generation.
///
/// `prior` maps segment names of the previous generation to their snapshots.
/// Leaves are processed in enumeration order; a known name is rebased onto
/// the new segment (inheriting its deletes), an unknown one is opened with no
/// deletes. A leaf that is not a segment fails the whole call.
pub fn reuse_snapshots<P>(
    prior: &AHashMap<&str, &SegmentSnapshot<P>>,
    leaves: Vec<StoreLeaf>,
    decorator: &dyn PayloadDecorator<P>,
    policy: SegmentReusePolicy,
) -> Result<(Vec<SegmentSnapshot<P>>, ReuseStats)> {
    let mut snapshots = Vec::with_capacity(leaves.len());
    let mut stats = ReuseStats::default();

    for leaf in leaves {
        let segment = match leaf {
            StoreLeaf::Segment(segment) => segment,
            other => {
                return Err(TesseraError::invalid_state(format!(
                    "leaf of kind '{}' is not a segment",
                    other.kind_name()
                )));
            }
        };

        let previous = prior
            .get(segment.name())
            .copied()
            .filter(|previous| policy.accepts(previous, segment.as_ref()));

        let snapshot = match previous {
            Some(previous) => {
                stats.reused += 1;
                previous.rebase(segment, decorator)?
            }
            None => {
                stats.created += 1;
                SegmentSnapshot::open(segment, decorator)?
            }
        };
        snapshots.push(snapshot);
    }

    Ok((snapshots, stats))
}

pub(super) fn ensure_composite(store: &dyn SegmentStore) -> Result<()> {
    match store.kind() {
        StoreKind::Composite => Ok(()),
        kind => Err(TesseraError::invalid_state(format!(
            "store of kind {kind:?} is not a multi-segment store"
        ))),
    }
}

/// Enumerate the store and build a view over that generation.
///
/// The generation handle is given back if anything fails after enumeration.
pub(super) fn open_generation<P>(
    store: &Arc<dyn SegmentStore>,
    prior: &AHashMap<&str, &SegmentSnapshot<P>>,
    decorator: Arc<dyn PayloadDecorator<P>>,
    config: CompositeViewConfig,
) -> Result<(CompositeView<P>, ReuseStats)> {
    ensure_composite(store.as_ref())?;
    let generation = store.enumerate()?;
    let handle = StoreHandle::new(Arc::clone(store), generation.version);

    let built = reuse_snapshots(
        prior,
        generation.leaves,
        decorator.as_ref(),
        config.reuse_policy,
    )
    .and_then(|(snapshots, stats)| {
        let boundaries =
            BoundaryIndex::from_doc_counts(snapshots.iter().map(|s| s.local_doc_count()))?;
        if config.validate_doc_counts && boundaries.total_doc_count() != generation.doc_count {
            return Err(TesseraError::invalid_state(format!(
                "segments hold {} documents but store generation {} reports {}",
                boundaries.total_doc_count(),
                generation.version,
                generation.doc_count
            )));
        }
        Ok((snapshots, boundaries, stats))
    });

    match built {
        Ok((snapshots, boundaries, stats)) => {
            let view = CompositeView::from_parts(
                handle, decorator, config, snapshots, boundaries, None,
            );
            Ok((view, stats))
        }
        Err(e) => {
            let _ = handle.dec_ref();
            Err(e)
        }
    }
}

impl<P> CompositeView<P> {
    /// Refresh against the store.
    ///
    /// Returns this very view when the store has not changed since it was
    /// built. Otherwise returns a new view over the current generation; this
    /// view stays valid and unchanged for anyone still holding it.
    ///
    /// Snapshots are matched by segment name (see
    /// [`SegmentReusePolicy`]). Under the default policy a segment rewritten
    /// in place under the same name inherits stale deletes.
    pub fn reopen(self: &Arc<Self>) -> Result<Arc<Self>> {
        self.check_closed()?;
        let started = Instant::now();
        let store = self.handle.store();
        ensure_composite(store.as_ref())?;

        if !store.has_changed_since(self.handle.version()) {
            self.log_reopen(started.elapsed(), "without change");
            return Ok(Arc::clone(self));
        }

        let prior = self.snapshot_table();
        let (view, stats) = open_generation(
            store,
            &prior,
            Arc::clone(&self.decorator),
            self.config.clone(),
        )?;
        debug!(
            "reopen {} -> {}: {} segments reused, {} opened",
            self.version(),
            view.version(),
            stats.reused,
            stats.created
        );
        self.log_reopen(started.elapsed(), "with change");
        Ok(Arc::new(view))
    }

    fn log_reopen(&self, elapsed: Duration, outcome: &str) {
        if elapsed >= self.config.slow_reopen_threshold() {
            info!("reopen returns in {}ms {outcome}", elapsed.as_millis());
        } else {
            debug!("reopen returns in {}ms {outcome}", elapsed.as_millis());
        }
    }
}
