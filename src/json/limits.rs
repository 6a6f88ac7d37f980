//! Resource limits for JSON decoding.
//!
//! The decoder keeps its own stack, so nesting is bounded by
//! [`Limits::max_depth`] rather than by the call stack of whichever thread
//! or coroutine happens to run it.

/// Default maximum nesting depth for arrays/objects.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Default maximum input size in bytes (16 MiB).
pub const DEFAULT_MAX_INPUT_SIZE: usize = 16 * 1024 * 1024;

/// Limits applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting depth of arrays and objects combined
    pub max_depth: usize,
    /// Maximum total input size in bytes
    pub max_input_size: usize,
}

impl Limits {
    /// Limits with a custom depth and the default input size.
    pub const fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}
