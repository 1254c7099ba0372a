//! Scheduler bindings: what runs on each cooperative lane

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::channel::Address;

/// Fast lane period (~60 Hz)
pub const FAST_LANE_MS: u64 = 16;

/// Slow lane period used for heartbeats
pub const SLOW_LANE_MS: u64 = 1000;

/// What a binding does on each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Poll the local channel and execute a pending payload
    Receive,
    /// Post a payload to the peer's channel
    Send,
}

/// One periodic lane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Binding {
    pub role: Role,

    /// Channel address; empty for the primary channel
    #[serde(default)]
    pub address: Address,

    /// Tick period in milliseconds
    pub period_ms: u64,

    /// Fixed payload for send bindings; a heartbeat is sent when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl Binding {
    pub fn receive(address: impl Into<Address>, period_ms: u64) -> Self {
        Self {
            role: Role::Receive,
            address: address.into(),
            period_ms,
            payload: None,
        }
    }

    pub fn send(address: impl Into<Address>, period_ms: u64, payload: Option<&str>) -> Self {
        Self {
            role: Role::Send,
            address: address.into(),
            period_ms,
            payload: payload.map(str::to_string),
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// The stock lanes: fast primary receive, slow heartbeat, one addressed send
/// with a fixed payload, one addressed receive
pub fn default_bindings() -> Vec<Binding> {
    vec![
        Binding::receive("", FAST_LANE_MS),
        Binding::send("", SLOW_LANE_MS, None),
        Binding::send("1", FAST_LANE_MS, Some("print(2); print_source_name(t.source)")),
        Binding::receive("2", FAST_LANE_MS),
    ]
}
