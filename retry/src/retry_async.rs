/*
 * Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 */

use super::backoff::{apply_jitter, BackoffSchedule};
use super::logger::{ExhaustionLogger, TracingLogger};
use super::retry_policy::RetryPolicy;
use super::retry_result::RetryError;
use super::sleeper::{Sleeper, TokioSleeper};
use retrier_config::backoff_policy::JitterStrategy;
use retrier_config::RetryConfig;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Retry the given operation asynchronously with the default collaborators: the tokio timer
/// and a `tracing` exhaustion log.
/// It can be used as follows:
/// ```
/// # use retrier_config::RetryConfig;
/// # use retrier_engine::retry_async::retry_async;
/// # use retrier_engine::retry_policy::RetryPolicy;
/// # use std::io::{Error, ErrorKind};
/// # let runtime = tokio::runtime::Runtime::new().unwrap();
/// let policy = RetryPolicy::new(RetryConfig::immediate(3));
/// let mut calls = 0;
/// let value = runtime.block_on(retry_async(&policy, "fetch", || {
///     calls += 1;
///     let attempt = calls;
///     async move {
///         if attempt < 3 {
///             Err(Error::from(ErrorKind::TimedOut))
///         } else {
///             Ok(attempt)
///         }
///     }
/// }));
/// assert_eq!(value.unwrap(), 3);
/// ```
pub async fn retry_async<F, Fut, T, E>(
    policy: &RetryPolicy<E>,
    operation: &str,
    work: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: StdError + 'static,
{
    RetryExecutor::default().execute(policy, operation, work).await
}

/// Drives the attempt loop of one operation at a time, suspending through `sleeper`
/// between attempts and reporting exhaustion to `logger`.
///
/// An executor holds no per-call state and can be shared by concurrent callers.
#[derive(new, Clone)]
pub struct RetryExecutor {
    sleeper: Arc<dyn Sleeper>,
    logger: Arc<dyn ExhaustionLogger>,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        RetryExecutor::new(Arc::new(TokioSleeper), Arc::new(TracingLogger))
    }
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RetryExecutor").finish()
    }
}

/// The mutable state of a single retry loop.
struct AttemptState<'a> {
    remaining_attempts: usize,
    retry_count: usize,
    total_delay: Duration,
    schedule: BackoffSchedule<'a>,
    jitter: JitterStrategy,
}

impl<'a> AttemptState<'a> {
    fn new(config: &'a RetryConfig) -> AttemptState<'a> {
        let schedule = BackoffSchedule::new(config);
        AttemptState {
            remaining_attempts: config.max_attempts(),
            retry_count: 0,
            total_delay: Duration::default(),
            jitter: schedule.jitter_strategy(),
            schedule,
        }
    }
}

impl RetryExecutor {
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> RetryExecutor {
        self.sleeper = sleeper;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ExhaustionLogger>) -> RetryExecutor {
        self.logger = logger;
        self
    }

    /// Invoke `work` until it succeeds, fails with an error the policy does not retry,
    /// or has been retried `max_attempts` times.
    pub async fn execute<F, Fut, T, E>(
        &self,
        policy: &RetryPolicy<E>,
        operation: &str,
        mut work: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: StdError + 'static,
    {
        let mut state = AttemptState::new(policy.config());
        loop {
            let delay = match work().await {
                Ok(value) => return Ok(value),
                Err(error) => self.on_failure(policy, operation, &mut state, error)?,
            };
            if let Some(delay) = delay {
                self.sleeper.sleep(delay).await;
            }
        }
    }

    /// Decide what follows a failed attempt: the delay before the next one, or the error
    /// that ends the loop.
    fn on_failure<E>(
        &self,
        policy: &RetryPolicy<E>,
        operation: &str,
        state: &mut AttemptState<'_>,
        error: E,
    ) -> Result<Option<Duration>, RetryError<E>>
    where
        E: StdError + 'static,
    {
        let config = policy.config();
        if state.remaining_attempts == 0 {
            debug!(
                "'{}' exhausted {} retries after {:?} of backoff",
                operation, state.retry_count, state.total_delay
            );
            if config.log_on_exhaustion() {
                self.logger.log(&error.to_string());
            }
            return if config.use_original_error() {
                Err(RetryError::Operation { source: error })
            } else {
                Err(RetryError::Exhausted {
                    operation: operation.to_owned(),
                    max_attempts: config.max_attempts(),
                    retry_count: state.retry_count,
                    total_delay: state.total_delay,
                    source: error,
                })
            };
        }

        if !policy.can_retry(&error) {
            debug!("'{}' failed with a non-retryable error: {}", operation, error);
            return Err(RetryError::Operation { source: error });
        }

        state.remaining_attempts -= 1;
        state.retry_count += 1;
        let delay = state
            .schedule
            .next()
            .map(|delay| apply_jitter(state.jitter, delay));
        if let Some(delay) = delay {
            state.total_delay += delay;
        }
        debug!(
            "'{}' failed, retry {} of {} in {:?}: {}",
            operation,
            state.retry_count,
            config.max_attempts(),
            delay.unwrap_or_default(),
            error
        );
        Ok(delay)
    }
}
