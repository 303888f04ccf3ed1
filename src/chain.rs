//! Error chain traversal.
//!
//! A chain is the sequence of errors reached by following
//! [`Error::source`] from an outer error to its root cause. Each node has at
//! most one successor. Traversal is bounded: a node seen twice, or a chain
//! longer than the configured limit, stops the walk and is reported as a
//! [`ChainFault`].
//!
//! Wrapping and backtrace capture are delegated to [`anyhow`]; the helpers
//! here are thin conveniences over it.

use std::error::Error;
use std::fmt::Display;

use crate::sentinel::Sentinel;

/// Default bound on the number of nodes visited in one walk.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A traversal fault. Legitimate code never produces either.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainFault {
    /// A node was reached twice.
    #[error("error chain cycle detected at depth {depth}")]
    Cycle {
        /// Number of nodes visited before the repeat.
        depth: usize,
    },

    /// The chain is longer than the configured limit.
    #[error("error chain exceeds {limit} nodes")]
    TooDeep {
        /// The limit that was hit.
        limit: usize,
    },
}

/// Iterator over an error chain, outermost node first.
pub struct Chain<'a> {
    next: Option<&'a (dyn Error + 'static)>,
    seen: Vec<*const (dyn Error + 'static)>,
    limit: usize,
    fault: Option<ChainFault>,
}

impl<'a> Chain<'a> {
    /// Starts a walk at `err` with the default depth limit.
    pub fn new(err: &'a (dyn Error + 'static)) -> Self {
        Self::with_limit(err, DEFAULT_MAX_DEPTH)
    }

    /// Starts a walk at `err` visiting at most `limit` nodes.
    pub fn with_limit(err: &'a (dyn Error + 'static), limit: usize) -> Self {
        Self {
            next: Some(err),
            seen: Vec::new(),
            limit,
            fault: None,
        }
    }

    /// Returns the fault that stopped the walk, if any.
    pub fn fault(&self) -> Option<&ChainFault> {
        self.fault.as_ref()
    }

    fn stop(&mut self, fault: ChainFault) -> Option<&'a (dyn Error + 'static)> {
        tracing::warn!(%fault, "stopping error chain traversal");
        self.next = None;
        self.fault = Some(fault);
        None
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn Error + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        let ptr = node as *const (dyn Error + 'static);

        if self.seen.iter().any(|seen| std::ptr::eq(*seen, ptr)) {
            return self.stop(ChainFault::Cycle {
                depth: self.seen.len(),
            });
        }
        if self.seen.len() >= self.limit {
            return self.stop(ChainFault::TooDeep { limit: self.limit });
        }

        self.seen.push(ptr);
        self.next = node.source();
        Some(node)
    }
}

/// Walks the chain of `err`, outermost node first.
pub fn chain<'a>(err: &'a (dyn Error + 'static)) -> Chain<'a> {
    Chain::new(err)
}

/// Collects the whole chain, or reports why the walk had to stop.
pub fn walk<'a>(
    err: &'a (dyn Error + 'static),
) -> Result<Vec<&'a (dyn Error + 'static)>, ChainFault> {
    let mut iter = Chain::new(err);
    let nodes: Vec<_> = iter.by_ref().collect();
    match iter.fault {
        Some(fault) => Err(fault),
        None => Ok(nodes),
    }
}

/// Returns true if the chain of `err` contains `sentinel`.
pub fn is(err: &(dyn Error + 'static), sentinel: &'static Sentinel) -> bool {
    chain(err).any(|node| sentinel.matches(node))
}

/// Returns the nearest node of type `T`, searching from the outermost error.
pub fn find<'a, T: Error + 'static>(err: &'a (dyn Error + 'static)) -> Option<&'a T> {
    chain(err).find_map(|node| node.downcast_ref::<T>())
}

/// Returns the direct cause of `err`.
pub fn unwrap<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a (dyn Error + 'static)> {
    err.source()
}

/// Returns the innermost reachable node of the chain.
pub fn root_cause<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    chain(err).last().unwrap_or(err)
}

/// Creates a new error from a message, capturing a backtrace when enabled.
pub fn new<M>(message: M) -> anyhow::Error
where
    M: Display + std::fmt::Debug + Send + Sync + 'static,
{
    anyhow::Error::msg(message)
}

/// Annotates `err` with a message, keeping `err` on the chain.
pub fn wrap<E, M>(err: E, message: M) -> anyhow::Error
where
    E: Into<anyhow::Error>,
    M: Display + Send + Sync + 'static,
{
    err.into().context(message)
}

/// Converts `err` into an [`anyhow::Error`], capturing a backtrace if it has
/// none yet.
pub fn with_stack<E: Into<anyhow::Error>>(err: E) -> anyhow::Error {
    err.into()
}
