//! Data structures for concurrent collections.
//!
//! # Organization
//!
//! - [`sorted`] - Lock-free sorted collections (`ListSet`)
//! - `internal` - Implementation details (pub(crate))

pub(crate) mod internal;
pub mod sorted;

pub use sorted::{ListSet, MAX_KEY, MIN_KEY, is_reserved};
