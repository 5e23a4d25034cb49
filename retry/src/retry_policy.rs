/*
 * Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 */

use super::retry_result::Classify;
use retrier_config::RetryConfig;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type Gate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// A resolved retry config plus the gates deciding which failures of `E` are worth retrying.
///
/// ```
/// # use retrier_config::RetryConfig;
/// # use retrier_engine::retry_policy::RetryPolicy;
/// # use std::time::Duration;
/// let config = RetryConfig::fixed(3, Duration::from_millis(10));
/// let policy = RetryPolicy::<std::io::Error>::new(config)
///     .retry_if(|e| e.kind() == std::io::ErrorKind::TimedOut);
/// assert!(!policy.can_retry(&std::io::Error::from(std::io::ErrorKind::NotFound)));
/// ```
pub struct RetryPolicy<E> {
    config: RetryConfig,
    predicate: Option<Gate<E>>,
    kind_filter: Option<Gate<E>>,
}

impl<E> RetryPolicy<E> {
    /// A policy retrying every failure.
    pub fn new(config: RetryConfig) -> RetryPolicy<E> {
        RetryPolicy {
            config,
            predicate: None,
            kind_filter: None,
        }
    }

    /// Only retry failures for which `predicate` returns true.
    pub fn retry_if<P>(mut self, predicate: P) -> RetryPolicy<E>
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Only retry failures whose kind is in `kinds`. An empty allow-list allows every kind.
    pub fn retry_on<I>(mut self, kinds: I) -> RetryPolicy<E>
    where
        E: Classify + 'static,
        I: IntoIterator<Item = E::Kind>,
    {
        let kinds: HashSet<E::Kind> = kinds.into_iter().collect();
        self.kind_filter = if kinds.is_empty() {
            None
        } else {
            Some(Arc::new(move |error: &E| kinds.contains(&error.kind())))
        };
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// The eligibility gate. The predicate is consulted first and short-circuits
    /// the kind allow-list.
    pub fn can_retry(&self, error: &E) -> bool {
        if let Some(predicate) = &self.predicate {
            if !predicate(error) {
                return false;
            }
        }
        match &self.kind_filter {
            Some(kind_filter) => kind_filter(error),
            None => true,
        }
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        RetryPolicy {
            config: self.config.clone(),
            predicate: self.predicate.clone(),
            kind_filter: self.kind_filter.clone(),
        }
    }
}

impl<E> From<RetryConfig> for RetryPolicy<E> {
    fn from(config: RetryConfig) -> Self {
        RetryPolicy::new(config)
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .field("predicate", &self.predicate.as_ref().map(|_| "<predicate>"))
            .field("kind_filter", &self.kind_filter.as_ref().map(|_| "<kinds>"))
            .finish()
    }
}
