//! Error type for set operations.

/// Errors returned by [`ListSet`](crate::ListSet) mutators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SetError {
    /// The key is one of the two values reserved for the head and tail
    /// sentinels (`i32::MIN` and `i32::MAX`) and can never be a member.
    #[error("key {key} is reserved for a list sentinel")]
    ReservedKey { key: i32 },
}
