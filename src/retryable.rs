//! Self-reported retryability.
//!
//! Any error type can state whether retrying makes sense by implementing
//! [`Retryable`] and registering itself with [`register_retryable!`]. The
//! classification engine probes every node of a chain against the registry,
//! so registered types are recognised wherever they sit in the chain and
//! from whichever crate they come.
//!
//! ```
//! use std::fmt;
//! use retrywise::{is_retryable, register_retryable, Retryable};
//!
//! #[derive(Debug)]
//! struct LeaseLost;
//!
//! impl fmt::Display for LeaseLost {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         f.write_str("lease lost")
//!     }
//! }
//!
//! impl std::error::Error for LeaseLost {}
//!
//! impl Retryable for LeaseLost {
//!     fn is_retryable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! register_retryable!(LeaseLost);
//!
//! fn main() {
//!     assert!(is_retryable(&LeaseLost));
//! }
//! ```

use std::error::Error;

/// An error that can answer whether retrying is appropriate.
pub trait Retryable: Error + Send + Sync + 'static {
    /// Returns true if the failed operation may succeed when retried.
    fn is_retryable(&self) -> bool;
}

/// A registered check that recognises one [`Retryable`] type.
pub struct RetryableProbe {
    probe: fn(&(dyn Error + 'static)) -> Option<bool>,
}

impl RetryableProbe {
    /// Creates a probe from a function that answers for the nodes it
    /// recognises and returns `None` for all others.
    pub const fn new(probe: fn(&(dyn Error + 'static)) -> Option<bool>) -> Self {
        Self { probe }
    }

    /// Runs the probe against a single node.
    pub fn probe(&self, node: &(dyn Error + 'static)) -> Option<bool> {
        (self.probe)(node)
    }
}

inventory::collect!(RetryableProbe);

#[doc(hidden)]
pub fn probe_for<T: Retryable>(node: &(dyn Error + 'static)) -> Option<bool> {
    node.downcast_ref::<T>().map(T::is_retryable)
}

/// Asks the registry whether `node` reports its own retryability.
///
/// Only the node itself is inspected, not its causes.
pub fn self_reported(node: &(dyn Error + 'static)) -> Option<bool> {
    inventory::iter::<RetryableProbe>
        .into_iter()
        .find_map(|probe| probe.probe(node))
}

/// Registers one or more [`Retryable`] types with the classification engine.
#[macro_export]
macro_rules! register_retryable {
    ($($ty:ty),+ $(,)?) => {
        $(
            $crate::inventory::submit! {
                $crate::RetryableProbe::new($crate::retryable::probe_for::<$ty>)
            }
        )+
    };
}
