//! Stack safety for recursive walks over nested values.
//!
//! Tuples nest without bound, and both repr and destruction walk them
//! recursively. Two tools keep those walks from overflowing:
//!
//! - [`ensure_sufficient_stack`] grows the native stack on demand (`stacker`),
//!   a no-op passthrough on wasm32.
//! - [`DepthGuard`] counts nesting and fails with `DepthExceeded` once the
//!   configured limit is passed, for walks that must stay bounded.

use crate::error::{RtResult, RuntimeError};

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly (WASM has its own stack management).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Nesting counter for a bounded recursive walk.
#[derive(Debug)]
pub struct DepthGuard {
    depth: usize,
    limit: usize,
}

impl DepthGuard {
    pub fn new(limit: usize) -> Self {
        DepthGuard { depth: 0, limit }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Run `f` one level deeper, growing the stack if needed.
    ///
    /// Fails without calling `f` when the new depth would pass the limit.
    pub fn descend<R>(&mut self, f: impl FnOnce(&mut Self) -> RtResult<R>) -> RtResult<R> {
        if self.depth >= self.limit {
            return Err(RuntimeError::DepthExceeded { limit: self.limit });
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }
}
