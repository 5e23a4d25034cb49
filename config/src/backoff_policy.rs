//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//

use std::fmt;
use std::time::Duration;

pub const DEFAULT_EXPONENTIAL_BACK_OFF: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// The shape of the delay inserted between two attempts.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum BackOffPolicy {
    /// Retry immediately.
    None,
    /// Wait the same `back_off` before every retry.
    Fixed,
    /// Grow the wait by `multiplier` after every retry, capped at `max_interval`.
    Exponential,
}

/// Randomization applied to the wait actually slept.
/// The growth sequence of an exponential backoff is never affected by it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum JitterStrategy {
    None,
    /// Uniform in `[0, delay)`.
    FullJitter,
    /// Uniform in `[delay / 2, delay)`.
    EqualJitter,
}

impl Default for JitterStrategy {
    fn default() -> Self {
        JitterStrategy::None
    }
}

/// Options only read under [`BackOffPolicy::Exponential`].
///
/// Override a subset of the defaults with struct update syntax:
/// ```
/// # use retrier_config::backoff_policy::ExponentialOption;
/// # use std::time::Duration;
/// let option = ExponentialOption {
///     multiplier: 3.0,
///     ..ExponentialOption::default()
/// };
/// assert_eq!(option.max_interval, Duration::from_millis(2000));
/// ```
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ExponentialOption {
    pub max_interval: Duration,
    pub multiplier: f64,
    pub jitter_strategy: JitterStrategy,
}

impl Default for ExponentialOption {
    fn default() -> Self {
        ExponentialOption {
            max_interval: DEFAULT_MAX_INTERVAL,
            multiplier: DEFAULT_MULTIPLIER,
            jitter_strategy: JitterStrategy::None,
        }
    }
}

impl ExponentialOption {
    pub fn new(max_interval: Duration, multiplier: f64) -> Self {
        ExponentialOption {
            max_interval,
            multiplier,
            jitter_strategy: JitterStrategy::None,
        }
    }

    pub fn jitter(mut self, jitter_strategy: JitterStrategy) -> Self {
        self.jitter_strategy = jitter_strategy;
        self
    }
}

impl fmt::Display for BackOffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
