//! Lock-free sorted collections.
//!
//! Collections are parameterized by a guard type `G: Guard` that determines
//! the memory reclamation strategy:
//!
//! - `DeferredGuard`: Testing - defers destruction until the set drops
//! - `EpochGuard`: Production - epoch-based reclamation (crossbeam-epoch)

pub mod list_set;

pub use list_set::{ListSet, MAX_KEY, MIN_KEY, is_reserved};
