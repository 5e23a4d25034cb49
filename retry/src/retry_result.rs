/*
 * Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 */

use snafu::Snafu;
use std::error::Error as StdError;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

/// An error that reports which kind of failure it is, so that a retry policy can
/// allow-list kinds instead of inspecting concrete types.
pub trait Classify: StdError {
    type Kind: Eq + Hash + Clone + Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

/// The error returned by a retried operation.
#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum RetryError<E>
where
    E: StdError + 'static,
{
    /// Every attempt failed. The last failure is kept as the source, along with
    /// whatever diagnostic context it carries.
    #[snafu(display(
        "Failed for '{}' for {} times.{}",
        operation,
        max_attempts,
        original_error_suffix(source)
    ))]
    Exhausted {
        operation: String,
        max_attempts: usize,
        /// Attempts made beyond the first one.
        retry_count: usize,
        /// Time spent waiting between attempts.
        total_delay: Duration,
        source: E,
    },

    /// The failure of the operation, untouched. Returned when a failure is not
    /// eligible for retry, or on exhaustion when the original error was requested.
    #[snafu(display("{}", source))]
    Operation { source: E },
}

fn original_error_suffix<E: StdError>(error: &E) -> String {
    let message = error.to_string();
    if message.is_empty() {
        message
    } else {
        format!(" Original Error: {}", message)
    }
}

impl<E: StdError + 'static> RetryError<E> {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Attempts made beyond the first one, only known for an exhausted operation.
    pub fn retry_count(&self) -> Option<usize> {
        match self {
            RetryError::Exhausted { retry_count, .. } => Some(*retry_count),
            RetryError::Operation { .. } => None,
        }
    }

    /// The last error returned by the operation.
    pub fn original(&self) -> &E {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::Operation { source } => source,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::Operation { source } => source,
        }
    }
}
