//! Lock-free ordered set of `i32` keys.
//!
//! [`ListSet`] is a sorted singly linked list with mark-then-unlink deletion:
//! `add`, `remove` and `contains` never take a lock, and every state change
//! is a single compare-and-swap on a node's successor word. `i32::MIN` and
//! `i32::MAX` are reserved for the head and tail sentinels.
//!
//! Memory reclamation is pluggable through [`Guard`]; this crate ships
//! [`DeferredGuard`], `urchin-crossbeam` ships an epoch-based guard.
//!
//! ```rust
//! use urchin_core::{DeferredGuard, ListSet, SetError};
//!
//! let set: ListSet<DeferredGuard> = ListSet::new();
//! assert_eq!(set.add(5), Ok(true));
//! assert_eq!(set.add(5), Ok(false));
//! assert!(set.contains(5));
//! assert!(set.remove(5));
//! assert!(!set.contains(5));
//! assert_eq!(set.add(i32::MAX), Err(SetError::ReservedKey { key: i32::MAX }));
//! ```

pub mod common_tests;
pub mod data_structures;
pub mod error;
pub mod guard;

pub use data_structures::{ListSet, MAX_KEY, MIN_KEY, is_reserved};
pub use error::SetError;
pub use guard::{DeferredGuard, Guard};
