//! Guard trait for memory reclamation strategies.
//!
//! A node removed from a [`ListSet`](crate::ListSet) may still be read by
//! threads that were traversing it when it was unlinked. The `Guard` trait
//! abstracts over how such nodes are kept alive until no reader can reach
//! them any more.
//!
//! # Design
//!
//! ```text
//! ListSet<G: Guard>
//!     │
//!     ├── ListSet<EpochGuard>      (production, urchin-crossbeam)
//!     └── ListSet<DeferredGuard>   (testing, frees on drop)
//! ```
//!
//! # Example
//!
//! ```rust
//! use urchin_core::{DeferredGuard, ListSet};
//!
//! let set: ListSet<DeferredGuard> = ListSet::new();
//! assert_eq!(set.add(42), Ok(true));
//! assert!(set.contains(42));
//! ```

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// # Safety Contract
///
/// Implementations must ensure that a node passed to `defer_destroy` is not
/// freed while any `ReadGuard` pinned before the call is still alive.
///
/// # Design Note
///
/// Guards are stored in collections and must be `Send + Sync`. The stored
/// guard schedules destruction; actual thread pinning happens per operation
/// through [`Guard::pin`].
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards this holds a pinned `crossbeam_epoch::Guard`.
    /// For deferred guards it is `()`, since nothing is freed before the
    /// collection itself drops.
    ///
    type ReadGuard: Sized;

    /// Pin an active read guard for the duration of one operation.
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the collection
    /// - `node` must be unlinked (not reachable from the collection's head)
    /// - `node` must not be passed to `defer_destroy` more than once
    /// - `dealloc` must be the correct deallocation function for `node`
    ///
    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
