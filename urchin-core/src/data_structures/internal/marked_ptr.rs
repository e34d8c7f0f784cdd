// Successor word of a list node: a node pointer whose least significant bit
// is the deletion mark.
//
// Bit layout:
//   Bit 0: DELETE_MARK - the node OWNING this word is logically removed and
//          the pointer part is frozen forever.
//
// Nodes are at least 8-byte aligned, so bit 0 of a real node address is
// always zero.
//
const DELETE_MARK: usize = 0b1;

/// Decoded state of a successor word.
///
/// `Live(next)` means the owning node belongs to the set; `Marked(next)`
/// means it has been logically removed and `next` is the successor recorded
/// at the moment of marking.
#[derive(Debug)]
pub(crate) enum Link<T> {
    Live(*mut T),
    Marked(*mut T),
}

// Manual impls to avoid requiring T: Copy/PartialEq
impl<T> Copy for Link<T> {}

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Link<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Link::Live(a), Link::Live(b)) | (Link::Marked(a), Link::Marked(b)) => a == b,
            _ => false,
        }
    }
}

impl<T> Link<T> {
    /// The downstream node, whatever the mark.
    #[inline]
    pub(crate) fn next(self) -> *mut T {
        match self {
            Link::Live(next) | Link::Marked(next) => next,
        }
    }

    #[inline]
    pub(crate) fn is_marked(self) -> bool {
        matches!(self, Link::Marked(_))
    }
}

/// A pointer that uses the least significant bit as the deletion mark.
pub(crate) struct MarkedPtr<T> {
    ptr: *mut T,
}

impl<T> Copy for MarkedPtr<T> {}

impl<T> Clone for MarkedPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> MarkedPtr<T> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Wrap a raw (possibly marked) word as loaded from an `AtomicPtr`.
    #[inline]
    pub(crate) fn new(ptr: *mut T) -> Self {
        debug_assert!(std::mem::align_of::<T>() > DELETE_MARK);
        MarkedPtr { ptr }
    }

    /// Encode a decoded link back into its raw word.
    #[inline]
    pub(crate) fn from_link(link: Link<T>) -> Self {
        match link {
            Link::Live(next) => MarkedPtr::new(next),
            Link::Marked(next) => MarkedPtr::new(next).with_mark(true),
        }
    }

    /// Strip the mark from a raw pointer without creating a MarkedPtr instance.
    #[inline]
    pub(crate) fn unmask(ptr: *mut T) -> *mut T {
        (ptr as usize & !DELETE_MARK) as *mut T
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Get the clean pointer without the mark (the one you dereference).
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        Self::unmask(self.ptr)
    }

    /// Get the raw word with the mark intact (for CAS operations).
    #[inline]
    pub(crate) fn as_raw(&self) -> *mut T {
        self.ptr
    }

    #[inline]
    pub(crate) fn link(&self) -> Link<T> {
        if self.is_marked() {
            Link::Marked(self.as_ptr())
        } else {
            Link::Live(self.ptr)
        }
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    #[inline]
    pub(crate) fn is_marked(&self) -> bool {
        (self.ptr as usize & DELETE_MARK) != 0
    }

    // =========================================================================
    // Transformers
    // =========================================================================

    /// Same target, with the mark set or cleared.
    #[inline]
    pub(crate) fn with_mark(&self, mark: bool) -> Self {
        let ptr_bits = self.as_ptr() as usize;
        let marked_bits = if mark {
            ptr_bits | DELETE_MARK
        } else {
            ptr_bits
        };
        MarkedPtr {
            ptr: marked_bits as *mut T,
        }
    }
}

impl<T> PartialEq for MarkedPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> std::fmt::Debug for MarkedPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkedPtr")
            .field("ptr", &self.as_ptr())
            .field("marked", &self.is_marked())
            .finish()
    }
}
