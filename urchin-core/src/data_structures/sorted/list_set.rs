use std::fmt;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicPtr, Ordering};

use crossbeam_utils::Backoff;

use crate::data_structures::internal::{Link, MarkedPtr};
use crate::error::SetError;
use crate::guard::Guard;

type NodePtr = *mut ListNode;

/// Key held by the head sentinel.
const HEAD_KEY: i32 = i32::MIN;
/// Key held by the tail sentinel.
const TAIL_KEY: i32 = i32::MAX;

/// Smallest key accepted by [`ListSet::add`].
pub const MIN_KEY: i32 = HEAD_KEY + 1;
/// Largest key accepted by [`ListSet::add`].
pub const MAX_KEY: i32 = TAIL_KEY - 1;

/// Returns `true` for the two keys reserved for the sentinels.
#[inline]
pub fn is_reserved(key: i32) -> bool {
    key == HEAD_KEY || key == TAIL_KEY
}

///
/// Lock-free ordered set of `i32` keys: a sorted singly linked list with
/// mark-then-unlink deletion.
///
// =============================================================================
// LIST SHAPE & INVARIANTS
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  10  │───►│  20  │───►│ TAIL │
// │ MIN  │    │      │    │      │    │ MAX  │
// └──────┘    └──────┘    └──────┘    └──────┘
//
// Each node's `next` word is Live(next) or Marked(next) (bit 0 of the word).
// Marked means the OWNING node is logically removed; the word is then frozen.
//
// INVARIANTS:
// 1. Keys reachable from HEAD through Live nodes are strictly ascending
// 2. A key is a member iff a reachable node holds it and is Live
// 3. Marking is one-way; a Marked word never changes again
// 4. HEAD and TAIL are never marked, never unlinked, always first/last
//
// Every `next` word of a published node changes only through CAS.
//
// =============================================================================
// REMOVE (Two-Phase Delete)
// =============================================================================
//
// Before:  pred ──────► curr ──────► succ
//
// Step 1 - CAS curr.next Live(succ) -> Marked(succ)   [linearization point]
//          pred ──────► curr ══╳══► succ
//
// Step 2 - CAS pred.next Live(curr) -> Live(succ)     [physical unlink]
//          pred ─────────────────────► succ
//
// Step 2 is attempted once. If it fails, the next traversal passing curr
// performs it instead. Whichever thread wins the unlink CAS hands curr to
// the guard, so every node is retired exactly once.
//
// An unlink CAS only succeeds while pred.next is Live(curr). A Live word
// means pred itself is not marked and therefore still reachable, so the
// winning CAS really does take curr out of the list.
//
// =============================================================================
// ADD OVER A MARKED NODE
// =============================================================================
//
// Traversal only helps unlink nodes with key < x, so the window for x may end
// at a Marked node holding x. That node is not a member; add inserts in
// front of it:
//
//          pred ──────► new(x) ──────► curr(x) ══╳══► succ
//
// The marked curr is unlinked by a later traversal with a larger target.
//
pub struct ListSet<G: Guard> {
    head: AtomicPtr<ListNode>,
    /// Receives every physically unlinked node.
    guard: G,
}

#[derive(Debug)]
pub(crate) struct ListNode {
    key: i32,
    next: AtomicPtr<ListNode>,
}

impl ListNode {
    fn alloc(key: i32, next: NodePtr) -> NodePtr {
        Box::into_raw(Box::new(ListNode {
            key,
            next: AtomicPtr::new(next),
        }))
    }

    /// # Safety
    /// `ptr` must come from [`ListNode::alloc`], be unreachable by other
    /// threads, and be freed only once.
    unsafe fn dealloc_ptr(ptr: NodePtr) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    #[inline]
    fn key(&self) -> i32 {
        self.key
    }

    /// Load and decode the successor word (Acquire ordering).
    #[inline]
    fn link(&self) -> Link<ListNode> {
        MarkedPtr::new(self.next.load(Ordering::Acquire)).link()
    }

    /// CAS the successor word from `expected` to `new` (AcqRel/Acquire ordering).
    ///
    /// On failure returns the link that was actually observed.
    #[inline]
    fn cas_link(
        &self,
        expected: Link<ListNode>,
        new: Link<ListNode>,
    ) -> Result<(), Link<ListNode>> {
        self.next
            .compare_exchange(
                MarkedPtr::from_link(expected).as_raw(),
                MarkedPtr::from_link(new).as_raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|actual| MarkedPtr::new(actual).link())
    }
}

// Adjacent pair bracketing a target key: pred.key < key <= curr.key.
//
#[derive(Debug, Copy, Clone)]
struct Window {
    pred: NodePtr,
    curr: NodePtr,
}

impl<G: Guard> ListSet<G> {
    /// Create an empty set holding only the head and tail sentinels.
    pub fn new() -> Self {
        let tail = ListNode::alloc(TAIL_KEY, std::ptr::null_mut());
        let head = ListNode::alloc(HEAD_KEY, tail);

        #[cfg(feature = "tracing")]
        tracing::debug!(guard = std::any::type_name::<G>(), "created list set");

        ListSet {
            head: AtomicPtr::new(head),
            guard: G::default(),
        }
    }

    /// The guard that receives unlinked nodes.
    pub fn guard(&self) -> &G {
        &self.guard
    }

    /// Insert `key`. Returns `Ok(true)` if it was newly inserted and
    /// `Ok(false)` if it was already present.
    ///
    /// `i32::MIN` and `i32::MAX` are reserved for the sentinels and are
    /// rejected with [`SetError::ReservedKey`]; the valid domain is
    /// [`MIN_KEY`]`..=`[`MAX_KEY`].
    ///
    pub fn add(&self, key: i32) -> Result<bool, SetError> {
        if is_reserved(key) {
            #[cfg(feature = "tracing")]
            tracing::warn!(key, "rejected reserved key");
            return Err(SetError::ReservedKey { key });
        }

        let _guard = G::pin();
        let backoff = Backoff::new();

        loop {
            let Window { pred, curr } = self.find_window(key);

            unsafe {
                // A Marked node holding the key is not a member; insert in
                // front of it.
                //
                if (*curr).key() == key && !(*curr).link().is_marked() {
                    return Ok(false);
                }

                let new_node = ListNode::alloc(key, curr);

                if (*pred)
                    .cas_link(Link::Live(curr), Link::Live(new_node))
                    .is_ok()
                {
                    return Ok(true);
                }

                // Never published, nobody else can see it.
                //
                ListNode::dealloc_ptr(new_node);
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(key, "add lost CAS, retrying");
            backoff.spin();
        }
    }

    /// Remove `key`. Returns `true` if this call removed it, `false` if it
    /// was not present (or a concurrent remover got there first).
    ///
    pub fn remove(&self, key: i32) -> bool {
        // Never members; the tail in particular must never be marked.
        if is_reserved(key) {
            return false;
        }

        let _guard = G::pin();
        let backoff = Backoff::new();

        loop {
            let Window { pred, curr } = self.find_window(key);

            unsafe {
                if (*curr).key() != key {
                    return false;
                }

                let succ = match (*curr).link() {
                    Link::Marked(_) => return false,
                    Link::Live(succ) => succ,
                };

                // Logical delete.
                //
                if (*curr)
                    .cas_link(Link::Live(succ), Link::Marked(succ))
                    .is_ok()
                {
                    // One unlink attempt; traversals finish the job if it fails.
                    //
                    if (*pred)
                        .cas_link(Link::Live(curr), Link::Live(succ))
                        .is_ok()
                    {
                        self.retire(curr);
                    }
                    return true;
                }
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(key, "remove lost CAS, retrying");
            backoff.spin();
        }
    }

    /// Membership test. Never mutates logical state, though the traversal
    /// may unlink marked nodes it passes.
    ///
    pub fn contains(&self, key: i32) -> bool {
        if is_reserved(key) {
            return false;
        }

        let _guard = G::pin();
        let Window { curr, .. } = self.find_window(key);

        unsafe { (*curr).key() == key && !(*curr).link().is_marked() }
    }

    /// Add every key from `keys`, returning how many were newly inserted.
    ///
    /// Stops at the first reserved key; keys before it stay inserted.
    ///
    pub fn add_all<I>(&self, keys: I) -> Result<usize, SetError>
    where
        I: IntoIterator<Item = i32>,
    {
        let mut count = 0;
        for key in keys {
            if self.add(key)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Number of Live keys.
    ///
    /// Not a snapshot: exact only when no mutation is in flight.
    ///
    pub fn len(&self) -> usize {
        let mut count = 0;
        let _ = self.try_for_each_live(|_| {
            count += 1;
            ControlFlow::Continue(())
        });
        count
    }

    /// Whether the set has no Live keys. Same consistency as [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.try_for_each_live(|_| ControlFlow::Break(())).is_continue()
    }

    /// Live keys in ascending order.
    ///
    /// Not a snapshot: exact only when no mutation is in flight.
    ///
    pub fn to_vec(&self) -> Vec<i32> {
        let mut keys = Vec::new();
        let _ = self.try_for_each_live(|key| {
            keys.push(key);
            ControlFlow::Continue(())
        });
        keys
    }

    /// Walk the list without helping, calling `f` for each Live key until it
    /// breaks.
    fn try_for_each_live<F>(&self, mut f: F) -> ControlFlow<()>
    where
        F: FnMut(i32) -> ControlFlow<()>,
    {
        let _guard = G::pin();
        let mut curr = unsafe { (*self.head.load(Ordering::Acquire)).link().next() };

        unsafe {
            while (*curr).key() != TAIL_KEY {
                let link = (*curr).link();
                if !link.is_marked() {
                    f((*curr).key())?;
                }
                curr = link.next();
            }
        }
        ControlFlow::Continue(())
    }

    // Core operation: window search with helping.
    //
    // Walks from HEAD until curr.key >= key, unlinking every Marked node it
    // passes. If an unlink CAS fails, pred.next changed under us (pred got
    // marked, or something was inserted or unlinked after it) and the walk
    // restarts from HEAD.
    //
    // Caller must hold a pinned read guard and `key` must not be reserved,
    // so the TAIL always stops the walk.
    //
    fn find_window(&self, key: i32) -> Window {
        'retry: loop {
            let mut pred = self.head.load(Ordering::Acquire);
            let mut curr = unsafe { (*pred).link().next() };

            loop {
                debug_assert!(!curr.is_null(), "walked past the tail sentinel");

                unsafe {
                    if (*curr).key() >= key {
                        return Window { pred, curr };
                    }

                    match (*curr).link() {
                        Link::Marked(succ) => {
                            if (*pred)
                                .cas_link(Link::Live(curr), Link::Live(succ))
                                .is_err()
                            {
                                #[cfg(feature = "tracing")]
                                tracing::trace!(key, "helping unlink failed, restarting");
                                continue 'retry;
                            }

                            // We unlinked it, so we retire it. pred stays put.
                            //
                            self.retire(curr);
                            curr = succ;
                        }
                        Link::Live(succ) => {
                            if (*curr).key() <= (*pred).key() {
                                consistency_fault((*pred).key(), (*curr).key());
                            }
                            pred = curr;
                            curr = succ;
                        }
                    }
                }
            }
        }
    }

    /// Hand a node to the guard.
    ///
    /// # Safety
    /// `node` must have just been unlinked by a CAS made by this thread.
    unsafe fn retire(&self, node: NodePtr) {
        unsafe { self.guard.defer_destroy(node, ListNode::dealloc_ptr) };
    }
}

#[cold]
fn consistency_fault(pred_key: i32, curr_key: i32) -> ! {
    #[cfg(feature = "tracing")]
    tracing::error!(pred_key, curr_key, "live keys out of order");

    panic!(
        "INVARIANT VIOLATION: live key {} found after live key {}",
        curr_key, pred_key
    );
}

impl<G: Guard> Default for ListSet<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Guard> fmt::Debug for ListSet<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.to_vec()).finish()
    }
}

impl<G: Guard> Drop for ListSet<G> {
    fn drop(&mut self) {
        // Free everything still reachable, sentinels and Marked-but-linked
        // nodes included. Unlinked nodes belong to the guard.
        //
        let mut curr = *self.head.get_mut();
        #[cfg(feature = "tracing")]
        let mut freed = 0usize;

        while !curr.is_null() {
            unsafe {
                let next = (*curr).link().next();
                ListNode::dealloc_ptr(curr);
                curr = next;
            }
            #[cfg(feature = "tracing")]
            {
                freed += 1;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(freed, "dropped list set");
    }
}

// ============================================================================
// Tests - white-box checks on list shape
// ============================================================================
// Note: behavioural suites are in common_tests and run per guard from tests/
