// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod environment;
mod handlers;
mod logging;
mod polling;

pub use environment::{EnvironmentConfig, EnvironmentConfigLayer};
pub use handlers::{HandlersConfig, HandlersConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use polling::{PollingConfig, PollingConfigLayer};
