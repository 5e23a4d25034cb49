//! Retry is a crate for retrying an asynchronous operation that can fail transiently,
//! with fixed or exponential backoff and optional jitter.
//! It is designed to have a declarative interface for ease of use.
//! It can be used as follows:
//! ```
//! # use retrier_config::RetryConfig;
//! # use retrier_engine::retry_async::retry_async;
//! # use retrier_engine::retry_policy::RetryPolicy;
//! # use std::time::Duration;
//! # let runtime = tokio::runtime::Runtime::new().unwrap();
//! let policy = RetryPolicy::new(RetryConfig::fixed(1, Duration::from_millis(1)));
//! let mut collection = vec![1, 2].into_iter();
//! let value = runtime.block_on(retry_async(&policy, "next_even", || {
//!     let next = collection.next();
//!     async move {
//!         match next {
//!             Some(n) if n == 2 => Ok(n),
//!             _ => Err(std::fmt::Error),
//!         }
//!     }
//! }));
//!
//! assert_eq!(value.unwrap(), 2);
//! ```
//! The above will retry the code once if it fails, waiting 1 millisecond first.
//! A failure rejected by the policy's predicate or kind allow-list is returned immediately
//! as `RetryError::Operation`. If all retries fail, it will return `RetryError::Exhausted`
//! whose message names the operation and whose source is the last failure.
//!

#![deny(
    clippy::all,
    clippy::cargo,
    clippy::else_if_without_else,
    clippy::empty_line_after_outer_attr,
    clippy::multiple_inherent_impl,
    clippy::mut_mut,
    clippy::path_buf_push_overwrite
)]
#![warn(
    clippy::cargo_common_metadata,
    clippy::mutex_integer,
    clippy::needless_borrow,
    clippy::similar_names
)]
#![allow(clippy::multiple_crate_versions)]

#[macro_use]
extern crate derive_new;

pub mod backoff;
pub mod logger;
pub mod retry_async;
pub mod retry_policy;
pub mod retry_result;
pub mod sleeper;
#[cfg(test)]
mod test;
