//! Internal implementation details.
//!
//! These are pub(crate) and not intended for external use.

pub mod marked_ptr;

pub(crate) use marked_ptr::{Link, MarkedPtr};
