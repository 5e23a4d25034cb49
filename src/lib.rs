//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//

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
#![allow(clippy::multiple_crate_versions, clippy::needless_doctest_main)]

//! Retry asynchronous operations that fail transiently.
//!
//! A [`RetryPolicy`] combines a [`RetryConfig`] (attempt budget, backoff shape, jitter) with
//! optional gates deciding which failures are worth another attempt. A policy is applied
//! either directly to a closure with [`retry_async`], or attached to a function once with
//! [`retryable`] and reused for every call:
//!
//! ```no_run
//! use retrier::{retryable, BackOffPolicy, RetryConfigBuilder, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn fetch(id: u64) -> Result<String, std::io::Error> { unimplemented!() }
//! # async fn run() {
//! let config = RetryConfigBuilder::default()
//!     .max_attempts(3)
//!     .back_off_policy(BackOffPolicy::Exponential)
//!     .build()
//!     .expect("valid config");
//! let fetch = retryable("fetch", RetryPolicy::new(config), fetch);
//! let body = fetch.call(42).await;
//! # }
//! ```
//!
//! [`RetryPolicy`]: crate::RetryPolicy
//! [`RetryConfig`]: crate::RetryConfig
//! [`retry_async`]: crate::retry_async
//! [`retryable`]: crate::retryable
//!
pub mod retryable;
pub mod trace;

pub use crate::retryable::{retryable, Retryable};
pub use retrier_config::backoff_policy::{BackOffPolicy, ExponentialOption, JitterStrategy};
pub use retrier_config::{RetryConfig, RetryConfigBuilder};
pub use retrier_engine::logger::{ExhaustionLogger, TracingLogger};
pub use retrier_engine::retry_async::{retry_async, RetryExecutor};
pub use retrier_engine::retry_policy::RetryPolicy;
pub use retrier_engine::retry_result::{Classify, RetryError};
pub use retrier_engine::sleeper::{Sleeper, TokioSleeper};
