// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! yascheduler-engine: the two control loops of §4.5/§4.6 —
//! [`coordinator::CloudCoordinator`] (node fleet scale-up/scale-down) and
//! [`reconciler::Reconciler`] (the scheduler loop's tick: harvest,
//! recover, assign, drain webhooks). Both are driven by the daemon on
//! the same `tokio` runtime, cooperating only through
//! `yascheduler-storage`'s repository (§5: "cross-task coordination is
//! via the database").

pub mod coordinator;
pub mod error;
pub mod reconciler;
pub mod webhook;

pub use coordinator::CloudCoordinator;
pub use error::{Disposition, EngineError};
pub use reconciler::{new_node_locks, NodeLocks, Reconciler};
pub use webhook::WebhookSender;
