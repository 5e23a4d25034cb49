//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//

use retrier::{retryable, trace, RetryConfig, RetryPolicy};
use std::io::{Error, ErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    trace::init()?;

    let counter = AtomicUsize::new(1);
    let function_to_retry = retryable(
        "function_to_retry",
        RetryPolicy::new(RetryConfig::fixed(3, Duration::from_millis(1000))),
        |_: ()| {
            info!(
                "Calling function_to_retry for the {} time",
                counter.fetch_add(1, Ordering::SeqCst)
            );
            async { Err::<(), _>(Error::new(ErrorKind::Other, "I failed!")) }
        },
    );

    if let Err(e) = function_to_retry.call(()).await {
        info!("All retry done as expected, final message: '{}'", e);
    }
    Ok(())
}
