//! Epoch-based guard implementation using crossbeam-epoch.
//!
//! `EpochGuard` is a zero-sized type that hands retired list nodes to the
//! global epoch collector. A set parameterized with it frees unlinked nodes
//! while it is still in use, instead of holding them until it drops:
//!
//! ```text
//! ListSet<EpochGuard>
//!     │
//!     ├── every add/remove/contains pins the calling thread
//!     └── the thread that unlinks a node defers its destruction
//! ```
//!
//! # Example
//!
//! ```rust
//! use urchin_core::ListSet;
//! use urchin_crossbeam::EpochGuard;
//!
//! let set: ListSet<EpochGuard> = ListSet::new();
//!
//! assert_eq!(set.add(42), Ok(true));
//! assert_eq!(set.add(17), Ok(true));
//! assert!(set.contains(42));
//!
//! assert!(set.remove(42));
//! assert_eq!(set.to_vec(), vec![17]);
//! ```

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use urchin_core::guard::Guard;

/// Epoch-based memory reclamation guard.
///
/// A retired node is not freed until every thread pinned at the time of
/// retirement has unpinned. Traversals pin for exactly one operation, so a
/// node unlinked mid-walk stays readable until that walk returns.
///
/// When `defer_destroy` is called, it:
/// 1. Pins the current thread (nested inside the operation's own pin)
/// 2. Schedules the destruction to run after all threads have advanced
/// 3. Unpins immediately
///
/// `EpochGuard` carries no state, so sets using it stay `Send + Sync`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpochGuard;

impl EpochGuard {
    pub fn new() -> Self {
        EpochGuard
    }

    /// Nudge the global collector so queued destructions can run.
    ///
    /// Only useful in tests and benchmarks that want reclamation to keep up
    /// with a burst of removals.
    pub fn flush() {
        epoch::pin().flush();
    }
}

impl Guard for EpochGuard {
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || {
                dealloc(node);
            });
        }
    }
}
