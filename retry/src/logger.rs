/*
 * Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 */

use tracing::warn;

/// Receives the message of the last failure once the retry budget is spent.
pub trait ExhaustionLogger: Send + Sync {
    fn log(&self, message: &str);
}

/// Forwards the message to the `tracing` subscriber at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ExhaustionLogger for TracingLogger {
    fn log(&self, message: &str) {
        warn!("{}", message);
    }
}
