//! Receiver - consumes and executes payloads addressed to the local side

use std::sync::Arc;

use keystore::{KeyValueStore, StoreError};
use tracing::{debug, info, warn};

use crate::channel::{Address, Channel, ChannelState, Side};
use crate::script::{Command, ExecContext, Interpreter, ScriptError};

use super::stats::{DispatchStats, StatsSnapshot};

/// Result of one receive pass
#[derive(Debug)]
pub enum PollOutcome {
    /// Nothing was pending
    Idle,

    /// A payload ran to completion
    Executed { output: Vec<String> },

    /// A payload was consumed but failed to parse or raised
    Failed { error: ScriptError, output: Vec<String> },

    /// The store could not be read; retried next tick
    Skipped(StoreError),
}

impl PollOutcome {
    /// True when a pending payload was consumed, successfully or not
    pub fn consumed(&self) -> bool {
        matches!(self, PollOutcome::Executed { .. } | PollOutcome::Failed { .. })
    }
}

/// Executes payloads posted to the local side's channels
///
/// Clones share the interpreter and counters.
#[derive(Clone)]
pub struct Receiver {
    store: Arc<dyn KeyValueStore>,
    local: Side,
    interpreter: Arc<Interpreter>,
    stats: Arc<DispatchStats>,
}

impl Receiver {
    pub fn new(store: Arc<dyn KeyValueStore>, local: Side, interpreter: Interpreter) -> Self {
        Self {
            store,
            local,
            interpreter: Arc::new(interpreter),
            stats: Arc::new(DispatchStats::default()),
        }
    }

    pub fn local(&self) -> Side {
        self.local
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Current state of the local channel at `address`
    pub fn peek(&self, address: &Address) -> keystore::Result<ChannelState> {
        Channel::new(self.local, address.clone()).state(self.store.as_ref())
    }

    /// Run the pending payload at `address`, if any
    ///
    /// The ready flag is lowered in the same store transaction that reads the
    /// payload, so a payload is consumed exactly once whether it succeeds,
    /// fails, or panics. Errors never escape; they are logged and reported in
    /// the returned outcome.
    pub fn poll_and_execute(&self, address: &Address) -> PollOutcome {
        let channel = Channel::new(self.local, address.clone());

        let payload = match channel.take(self.store.as_ref()) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                self.stats.record_idle();
                return PollOutcome::Idle;
            }
            Err(e) => {
                warn!(side = %self.local, %address, error = %e, "Store unavailable, skipping tick");
                self.stats.record_skipped();
                return PollOutcome::Skipped(e);
            }
        };

        debug!(side = %self.local, %address, bytes = payload.len(), "Receiver: executing payload");
        let command = Command::new(payload);
        let mut ctx = ExecContext::new(&self.interpreter, self.local, address);
        let result = command.execute(&mut ctx);
        let output = ctx.into_output();

        match result {
            Ok(()) => {
                self.stats.record_executed();
                info!(side = %self.local, %address, lines = output.len(), "Payload executed");
                PollOutcome::Executed { output }
            }
            Err(error) => {
                self.stats.record_failed();
                warn!(side = %self.local, %address, error = %error, "Payload failed");
                PollOutcome::Failed { error, output }
            }
        }
    }
}
