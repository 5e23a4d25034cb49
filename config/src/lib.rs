//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
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
#![allow(clippy::multiple_crate_versions)]
pub mod backoff_policy;

use crate::backoff_policy::{BackOffPolicy, ExponentialOption, DEFAULT_EXPONENTIAL_BACK_OFF};
use derive_builder::*;
use getset::CopyGetters;
use std::time::Duration;
use tracing::debug;

/// The data half of a retry policy.
///
/// Defaults are resolved once, when the builder runs, and the result is never mutated afterwards,
/// so one `RetryConfig` can be shared by any number of concurrent retry loops.
#[derive(Builder, Debug, CopyGetters, Clone, PartialEq)]
#[builder(build_fn(private, name = "build_raw"))]
pub struct RetryConfig {
    /// Retries permitted after the initial attempt.
    #[get_copy = "pub"]
    max_attempts: usize,

    #[get_copy = "pub"]
    #[builder(default = "self.default_back_off_policy()")]
    back_off_policy: BackOffPolicy,

    /// Base delay. `None` means retries follow each other without waiting.
    #[get_copy = "pub"]
    #[builder(setter(into), default)]
    back_off: Option<Duration>,

    #[get_copy = "pub"]
    #[builder(default)]
    exponential_option: ExponentialOption,

    /// Surface the last error of the operation as is once attempts are exhausted.
    #[get_copy = "pub"]
    #[builder(default = "false")]
    use_original_error: bool,

    #[get_copy = "pub"]
    #[builder(default = "true")]
    log_on_exhaustion: bool,
}

impl RetryConfigBuilder {
    /// Resolve the defaults and validate the result.
    pub fn build(&self) -> Result<RetryConfig, String> {
        let config = self.build_raw().map_err(|e| e.to_string())?.normalize();
        config.validate()?;
        debug!("resolved retry config {:?}", config);
        Ok(config)
    }

    fn default_back_off_policy(&self) -> BackOffPolicy {
        match self.back_off {
            Some(Some(back_off)) if !back_off.is_zero() => BackOffPolicy::Fixed,
            _ => BackOffPolicy::None,
        }
    }
}

impl RetryConfig {
    /// Retry `max_attempts` times, waiting `back_off` before each retry.
    pub fn fixed(max_attempts: usize, back_off: Duration) -> RetryConfig {
        RetryConfig {
            max_attempts,
            back_off_policy: BackOffPolicy::Fixed,
            back_off: Some(back_off),
            exponential_option: ExponentialOption::default(),
            use_original_error: false,
            log_on_exhaustion: true,
        }
        .normalize()
    }

    /// Retry `max_attempts` times with the default exponential backoff:
    /// 1s initial delay, doubling up to 2s.
    pub fn exponential(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            back_off_policy: BackOffPolicy::Exponential,
            back_off: None,
            exponential_option: ExponentialOption::default(),
            use_original_error: false,
            log_on_exhaustion: true,
        }
        .normalize()
    }

    /// Retry `max_attempts` times without waiting.
    pub fn immediate(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            back_off_policy: BackOffPolicy::None,
            back_off: None,
            exponential_option: ExponentialOption::default(),
            use_original_error: false,
            log_on_exhaustion: true,
        }
    }

    fn normalize(mut self) -> RetryConfig {
        self.back_off = self.back_off.filter(|back_off| !back_off.is_zero());
        if self.back_off_policy == BackOffPolicy::Exponential && self.back_off.is_none() {
            self.back_off = Some(DEFAULT_EXPONENTIAL_BACK_OFF);
        }
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.back_off_policy != BackOffPolicy::Exponential {
            return Ok(());
        }
        let option = &self.exponential_option;
        if !option.multiplier.is_finite() || option.multiplier < 1.0 {
            return Err(format!(
                "exponential multiplier {} must be a finite number no less than 1",
                option.multiplier
            ));
        }
        // normalize guarantees a base delay under the exponential policy
        let back_off = self.back_off.unwrap_or(DEFAULT_EXPONENTIAL_BACK_OFF);
        if option.max_interval < back_off {
            Err(format!(
                "max interval {:?} is shorter than back off {:?}",
                option.max_interval, back_off
            ))
        } else {
            Ok(())
        }
    }
}
