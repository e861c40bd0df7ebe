//! Recursion guard for walks over possibly cyclic schema trees
//!
//! A [`RecursionGuard`] holds the limits; each walk opens its own
//! [`GuardContext`] and calls [`RecursionGuard::check`] before every descent.

use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::core::GuardLimits;

/// Reasons a guarded walk was aborted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("maximum depth {max} exceeded (reached {depth})")]
    DepthExceeded { depth: usize, max: usize },

    #[error("maximum node count {max} exceeded")]
    NodeLimitExceeded { max: usize },

    #[error("walk exceeded its {timeout:?} deadline")]
    DeadlineExceeded { timeout: Duration },

    #[error("walk cancelled by caller")]
    Cancelled,
}

/// Per-walk counting state
#[derive(Debug)]
pub struct GuardContext {
    deadline: Instant,
    visited: Cell<usize>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl GuardContext {
    /// Number of `check` calls made so far
    pub fn visited(&self) -> usize {
        self.visited.get()
    }
}

/// Depth, node-count and deadline bounds shared by every guarded walk
#[derive(Debug, Clone)]
pub struct RecursionGuard {
    limits: GuardLimits,
    cancellation: Option<Arc<AtomicBool>>,
}

impl RecursionGuard {
    pub fn new(limits: GuardLimits) -> Self {
        Self {
            limits,
            cancellation: None,
        }
    }

    /// Propagate a caller-owned cancellation flag into every context
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn limits(&self) -> &GuardLimits {
        &self.limits
    }

    /// Start a fresh counting context for one walk
    pub fn with_context(&self) -> GuardContext {
        GuardContext {
            deadline: Instant::now() + self.limits.timeout(),
            visited: Cell::new(0),
            cancelled: self.cancellation.clone(),
        }
    }

    /// Account for one more node at `depth`
    pub fn check(&self, ctx: &GuardContext, depth: usize) -> Result<(), GuardError> {
        if let Some(flag) = &ctx.cancelled {
            if flag.load(Ordering::Relaxed) {
                return Err(GuardError::Cancelled);
            }
        }
        if depth > self.limits.max_depth {
            return Err(GuardError::DepthExceeded {
                depth,
                max: self.limits.max_depth,
            });
        }
        let visited = ctx.visited.get() + 1;
        ctx.visited.set(visited);
        if visited > self.limits.max_nodes {
            return Err(GuardError::NodeLimitExceeded {
                max: self.limits.max_nodes,
            });
        }
        if Instant::now() >= ctx.deadline {
            return Err(GuardError::DeadlineExceeded {
                timeout: self.limits.timeout(),
            });
        }
        Ok(())
    }
}

impl Default for RecursionGuard {
    fn default() -> Self {
        Self::new(GuardLimits::default())
    }
}
