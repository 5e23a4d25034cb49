//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//

use tracing::dispatcher::SetGlobalDefaultError;
use tracing::{dispatcher, Dispatch, Level};
use tracing_subscriber::FmtSubscriber;

/// Install a formatting subscriber printing events at info level and above.
pub fn init() -> Result<(), SetGlobalDefaultError> {
    init_with_level(Level::INFO)
}

/// Install a formatting subscriber printing events at `level` and above.
/// This function can only succeed once per process.
pub fn init_with_level(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_ansi(true)
        .with_max_level(level)
        .finish();

    dispatcher::set_global_default(Dispatch::new(subscriber))
}
