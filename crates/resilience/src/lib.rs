// crates/resilience/src/lib.rs
//! Retry primitives for fault-tolerant remote calls
//!
//! The remote client builds on this crate: every outbound write runs
//! under [`with_retry`] with an exponential-backoff [`RetryPolicy`] and a
//! retryability predicate that stops on explicit rejections.
//!
//! # Example
//!
//! ```rust
//! use fleetsync_resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3)
//!     .with_initial_delay(Duration::from_millis(100));
//! assert_eq!(policy.max_attempts(), 3);
//! ```

mod error;
mod retry;

pub use error::RetryError;
pub use retry::{with_retry, RetryPolicy};
