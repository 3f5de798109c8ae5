// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! yascheduler-config: typed configuration loading (§6).
//!
//! Parses the INI-style config file into [`Config`], one struct per
//! section, with `%(key)s` interpolation and unknown-key warnings. Any
//! failure here is [`ConfigError`] and is fatal at startup — there is no
//! partial or retryable config state.

mod error;
mod load;
mod model;

pub use error::ConfigError;
pub use model::{
    CloudConfig, CloudKind, Config, DbConfig, JumpHost, LocalConfig, RateLimits, RemoteConfig, UnknownKey,
};
