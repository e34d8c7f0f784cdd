//! Crossbeam-based reclamation for urchin sets.
//!
//! This crate provides `EpochGuard`, an implementation of the
//! [`Guard`](urchin_core::Guard) trait using crossbeam-epoch.
//!
//! # Usage
//!
//! ```rust
//! use urchin_core::ListSet;
//! use urchin_crossbeam::EpochGuard;
//!
//! let set: ListSet<EpochGuard> = ListSet::new();
//! assert_eq!(set.add(42), Ok(true));
//! ```

pub mod epoch_guard;

pub use epoch_guard::EpochGuard;
