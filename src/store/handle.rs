//! Reference-counted handle on one opened store generation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::{debug, warn};

use crate::error::{Result, TesseraError};
use crate::store::traits::SegmentStore;

/// Shared handle on a store generation.
///
/// The count starts at one for the opener. Every snapshot copy adds one.
/// When the count reaches zero the generation is released on the store, and
/// that happens at most once.
#[derive(Debug)]
pub struct StoreHandle {
    store: Arc<dyn SegmentStore>,
    version: u64,
    refs: AtomicUsize,
    released: AtomicBool,
}

impl StoreHandle {
    /// Open a handle on `version` with a reference count of one.
    pub fn new(store: Arc<dyn SegmentStore>, version: u64) -> Arc<Self> {
        Arc::new(StoreHandle {
            store,
            version,
            refs: AtomicUsize::new(1),
            released: AtomicBool::new(false),
        })
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn SegmentStore> {
        &self.store
    }

    /// Store version this handle was opened at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Outstanding references.
    pub fn ref_count(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }

    /// Whether the generation has been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Add a reference. Fails once the count has dropped to zero.
    pub fn inc_ref(&self) -> Result<()> {
        let mut current = self.refs.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return Err(TesseraError::closed(format!(
                    "store generation {} already released",
                    self.version
                )));
            }
            match self.refs.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    /// Drop a reference, releasing the generation when it was the last one.
    pub fn dec_ref(&self) -> Result<()> {
        let mut current = self.refs.load(Ordering::Acquire);
        loop {
            if current == 0 {
                warn!("dec_ref on released store generation {}", self.version);
                return Err(TesseraError::closed(format!(
                    "store generation {} already released",
                    self.version
                )));
            }
            match self.refs.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if current == 1 {
                        self.release_once();
                    }
                    return Ok(());
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn release_once(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            debug!("releasing store generation {}", self.version);
            self.store.release(self.version);
        }
    }
}
