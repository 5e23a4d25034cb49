//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//

use retrier_engine::retry_async::RetryExecutor;
use retrier_engine::retry_policy::RetryPolicy;
use retrier_engine::retry_result::RetryError;
use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use tracing::info_span;
use tracing_futures::Instrument;

/// An asynchronous function paired with a retry policy.
///
/// Calling it has the same shape as calling the wrapped function, except that failures are
/// retried according to the policy. Every attempt receives a clone of the arguments given to
/// [`call`](Retryable::call).
///
/// ```
/// # use retrier::retryable::retryable;
/// # use retrier_config::RetryConfig;
/// # use retrier_engine::retry_policy::RetryPolicy;
/// # let runtime = tokio::runtime::Runtime::new().unwrap();
/// let parse = retryable(
///     "parse",
///     RetryPolicy::new(RetryConfig::immediate(2)),
///     |input: String| async move { input.parse::<u32>() },
/// );
/// assert_eq!(runtime.block_on(parse.call("42".to_owned())).unwrap(), 42);
/// assert!(runtime.block_on(parse.call("x".to_owned())).unwrap_err().is_exhausted());
/// ```
pub struct Retryable<F, E> {
    name: String,
    policy: Arc<RetryPolicy<E>>,
    executor: RetryExecutor,
    work: F,
}

/// Wrap `work` so that calling it applies `policy`. `name` identifies the operation in
/// the exhaustion error.
pub fn retryable<F, E>(
    name: impl Into<String>,
    policy: impl Into<Arc<RetryPolicy<E>>>,
    work: F,
) -> Retryable<F, E> {
    Retryable::new(name, policy, work)
}

impl<F, E> Retryable<F, E> {
    pub fn new(
        name: impl Into<String>,
        policy: impl Into<Arc<RetryPolicy<E>>>,
        work: F,
    ) -> Retryable<F, E> {
        Retryable {
            name: name.into(),
            policy: policy.into(),
            executor: RetryExecutor::default(),
            work,
        }
    }

    /// Use custom sleep and logging collaborators.
    pub fn with_executor(mut self, executor: RetryExecutor) -> Retryable<F, E> {
        self.executor = executor;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }

    pub async fn call<A, Fut, T>(&self, args: A) -> Result<T, RetryError<E>>
    where
        F: Fn(A) -> Fut,
        A: Clone,
        Fut: Future<Output = Result<T, E>>,
        E: StdError + 'static,
    {
        let span = info_span!("retryable", operation = %self.name);
        self.executor
            .execute(&self.policy, &self.name, || (self.work)(args.clone()))
            .instrument(span)
            .await
    }
}

impl<F: Clone, E> Clone for Retryable<F, E> {
    fn clone(&self) -> Self {
        Retryable {
            name: self.name.clone(),
            policy: self.policy.clone(),
            executor: self.executor.clone(),
            work: self.work.clone(),
        }
    }
}
