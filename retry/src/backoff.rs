/*
 * Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 */

use rand::Rng;
use retrier_config::backoff_policy::{BackOffPolicy, JitterStrategy};
use retrier_config::RetryConfig;
use std::convert::TryFrom;
use std::iter::Iterator;
use std::time::Duration;

/// The delay before the first retry, `None` if retries should not wait.
pub fn initial_delay(config: &RetryConfig) -> Option<Duration> {
    config.back_off()
}

/// Evolve the delay for the attempt following `attempt`.
/// Only the exponential policy changes it; the result never exceeds `max_interval`.
/// The attempt index is part of the calculator's signature but no current policy reads it.
pub fn next_delay(config: &RetryConfig, current: Duration, _attempt: usize) -> Duration {
    match config.back_off_policy() {
        BackOffPolicy::Exponential => {
            let option = config.exponential_option();
            let grown = current.as_nanos() as f64 * option.multiplier;
            if grown >= option.max_interval.as_nanos() as f64 {
                option.max_interval
            } else {
                Duration::from_nanos(grown.round() as u64)
            }
        }
        BackOffPolicy::Fixed | BackOffPolicy::None => current,
    }
}

/// Randomize the delay that will actually be slept, using the thread local generator.
pub fn apply_jitter(strategy: JitterStrategy, delay: Duration) -> Duration {
    apply_jitter_with(strategy, delay, &mut rand::thread_rng())
}

/// Same as [`apply_jitter`] with a caller supplied generator.
pub fn apply_jitter_with<R: Rng + ?Sized>(
    strategy: JitterStrategy,
    delay: Duration,
    rng: &mut R,
) -> Duration {
    match strategy {
        JitterStrategy::None => delay,
        JitterStrategy::FullJitter => random_below(rng, delay),
        JitterStrategy::EqualJitter => {
            let half = delay / 2;
            half + random_below(rng, delay - half)
        }
    }
}

fn random_below<R: Rng + ?Sized>(rng: &mut R, upper: Duration) -> Duration {
    let upper = u64::try_from(upper.as_nanos()).unwrap_or(u64::MAX);
    if upper == 0 {
        return Duration::default();
    }
    Duration::from_nanos(rng.gen_range(0..upper))
}

/// The unjittered delays between consecutive attempts: `b0, next(b0), next(next(b0)), ...`.
///
/// The schedule is empty when the config has no base delay and infinite otherwise;
/// the retry loop, not the schedule, owns the attempt budget.
#[derive(Debug, Clone)]
pub struct BackoffSchedule<'a> {
    config: &'a RetryConfig,
    current: Option<Duration>,
    attempt: usize,
}

impl<'a> BackoffSchedule<'a> {
    pub fn new(config: &'a RetryConfig) -> BackoffSchedule<'a> {
        BackoffSchedule {
            config,
            current: initial_delay(config),
            attempt: 0,
        }
    }

    /// The jitter strategy to apply on each yielded delay.
    pub fn jitter_strategy(&self) -> JitterStrategy {
        match self.config.back_off_policy() {
            BackOffPolicy::Exponential => self.config.exponential_option().jitter_strategy,
            BackOffPolicy::Fixed | BackOffPolicy::None => JitterStrategy::None,
        }
    }
}

impl Iterator for BackoffSchedule<'_> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.current?;
        self.attempt += 1;
        self.current = Some(next_delay(self.config, delay, self.attempt));
        Some(delay)
    }
}
