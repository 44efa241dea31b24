//! Invoker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a call does when another transform holds the compute module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ContentionPolicy {
    /// Queue behind the call in flight.
    #[default]
    Wait,
    /// Queue for at most `timeout_ms`, then fail with `Busy`.
    WaitFor { timeout_ms: u64 },
    /// Fail with `Busy` immediately.
    Reject,
}

/// Runtime configuration for a [`TransformInvoker`](crate::TransformInvoker).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    pub contention: ContentionPolicy,
    /// How long `apply` blocks for the module to finish loading before
    /// returning `NotReady`. Zero refuses immediately.
    pub ready_timeout_ms: u64,
}

impl InvokerConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}
