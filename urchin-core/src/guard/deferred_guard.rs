//! Deferred guard implementation for testing.
//!
//! `DeferredGuard` holds on to every node handed to it and frees them all
//! when the guard (and therefore its owning set) is dropped.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use super::Guard;

/// A simple guard that defers all node destruction until the guard is dropped.
///
/// Useful in tests where destruction timing must be predictable. Not suitable
/// for long-running sets: memory accumulates until the guard drops.
///
/// In debug builds every deferred address is tracked and a second
/// `defer_destroy` of the same node panics, which catches a node being
/// unlinked twice.
///
pub struct DeferredGuard {
    deferred: Mutex<Vec<DeferredNode>>,
    #[cfg(debug_assertions)]
    seen: Mutex<HashSet<usize>>,
}

struct DeferredNode {
    ptr: *mut (),
    dealloc: unsafe fn(*mut ()),
}

// Safety: the pointer is only dereferenced by `dealloc`, once, from `Drop`.
unsafe impl Send for DeferredNode {}

impl DeferredGuard {
    pub fn new() -> Self {
        DeferredGuard {
            deferred: Mutex::new(Vec::new()),
            #[cfg(debug_assertions)]
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Number of nodes waiting to be freed.
    pub fn pending(&self) -> usize {
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for DeferredGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredGuard {
    fn drop(&mut self) {
        let nodes = self
            .deferred
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);

        // Check for duplicates before freeing
        let mut seen: HashSet<usize> = HashSet::with_capacity(nodes.len());
        let dup_count = nodes
            .iter()
            .filter(|node| !seen.insert(node.ptr as usize))
            .count();
        if dup_count > 0 {
            #[cfg(feature = "tracing")]
            tracing::error!(dup_count, total = nodes.len(), "duplicate deferred nodes");
            panic!("Found {} duplicate pointer(s) in deferred list", dup_count);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(freed = nodes.len(), "releasing deferred nodes");

        for node in nodes.drain(..) {
            unsafe {
                (node.dealloc)(node.ptr);
            }
        }
    }
}

impl Guard for DeferredGuard {
    /// No-op: every node stays valid until the owning collection drops.
    type ReadGuard = ();

    fn pin() -> Self::ReadGuard {}

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        #[cfg(debug_assertions)]
        {
            let addr = node as usize;
            let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
            if !seen.insert(addr) {
                panic!("DUPLICATE defer_destroy at {:#x}", addr);
            }
        }

        let node = DeferredNode {
            ptr: node as *mut (),
            dealloc: unsafe {
                std::mem::transmute::<unsafe fn(*mut N), unsafe fn(*mut ())>(dealloc)
            },
        };
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(node);
    }
}
