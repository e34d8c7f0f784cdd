//! Shared test suites, generic over the reclamation guard.
//!
//! Each guard's crate instantiates these from its own `tests/` directory, so
//! `DeferredGuard` and `EpochGuard` are held to the same behaviour.

pub mod history;
pub mod set_core_tests;
