//! Sender - posts payloads to the peer side

use std::sync::Arc;

use chrono::{DateTime, Utc};
use keystore::KeyValueStore;
use tracing::debug;

use crate::channel::{Address, Channel, Side};

/// Timestamp format embedded in heartbeat payloads
pub const HEARTBEAT_TIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// Heartbeat payload sent when no payload is supplied
pub fn heartbeat_payload(from: Side, now: DateTime<Utc>) -> String {
    format!(
        "print(\"hello from {}, time: {}\")",
        from.runtime_name(),
        now.format(HEARTBEAT_TIME_FORMAT)
    )
}

/// Writes payloads into the channels consumed by the peer side
#[derive(Clone)]
pub struct Sender {
    store: Arc<dyn KeyValueStore>,
    local: Side,
}

impl Sender {
    /// Sender for the process running as `local`; payloads go to `local.other()`
    pub fn new(store: Arc<dyn KeyValueStore>, local: Side) -> Self {
        Self { store, local }
    }

    pub fn local(&self) -> Side {
        self.local
    }

    /// Side whose channels this sender writes
    pub fn target(&self) -> Side {
        self.local.other()
    }

    /// Post `payload` (or a heartbeat) and raise the ready flag
    ///
    /// Never waits for the peer. A pending payload the peer has not consumed
    /// yet is overwritten.
    pub fn dispatch(&self, address: &Address, payload: Option<&str>) -> keystore::Result<()> {
        let channel = Channel::new(self.target(), address.clone());
        let payload = match payload {
            Some(p) => p.to_string(),
            None => heartbeat_payload(self.local, Utc::now()),
        };

        channel.post(self.store.as_ref(), &payload)?;
        debug!(
            target_side = %self.target(),
            %address,
            bytes = payload.len(),
            "Sender::dispatch: posted"
        );
        Ok(())
    }
}
