//! Scheduler for the dispatch handshake
//!
//! Drives receivers and senders at fixed intervals. Two backends, chosen once
//! at startup:
//!
//! - [`CooperativeScheduler`] - one callback per [`Binding`] on the host's
//!   [`TimerHost`], all run on the host's control thread
//! - [`ThreadedScheduler`] - one background thread running the primary
//!   channel's receive-then-send cycle
//!
//! Both release everything they hold on [`Scheduler::stop`] or on drop.

mod binding;
mod cooperative;
mod threaded;
mod timer;

pub use binding::{Binding, FAST_LANE_MS, Role, SLOW_LANE_MS, default_bindings};
pub use cooperative::CooperativeScheduler;
pub use threaded::ThreadedScheduler;
pub use timer::{TimerCallback, TimerHost, TimerId, TimerWheel};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::channel::Address;
use crate::dispatch::{Receiver, Sender};

/// Scheduling backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Timer callbacks on the host's control thread
    #[default]
    Cooperative,
    /// Dedicated background thread
    Threaded,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Cooperative => write!(f, "cooperative"),
            Mode::Threaded => write!(f, "threaded"),
        }
    }
}

/// Errors from starting or stopping a scheduler
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler is already running")]
    AlreadyRunning,

    #[error("Scheduler is not running")]
    NotRunning,

    #[error("Failed to spawn dispatch thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    #[error("Dispatch thread panicked")]
    ThreadPanicked,
}

/// A running source of dispatch ticks
pub trait Scheduler: Send {
    /// Begin ticking
    fn start(&mut self) -> Result<(), SchedulerError>;

    /// Stop ticking and release timers or threads
    fn stop(&mut self) -> Result<(), SchedulerError>;

    fn is_running(&self) -> bool;

    fn mode(&self) -> Mode;
}

/// One send tick; store errors are logged and dropped
pub(crate) fn send_tick(sender: &Sender, address: &Address, payload: Option<&str>) {
    if let Err(e) = sender.dispatch(address, payload) {
        warn!(%address, error = %e, "Dispatch failed, skipping tick");
    }
}

/// One receive tick; the receiver already contains every failure
pub(crate) fn receive_tick(receiver: &Receiver, address: &Address) {
    let _ = receiver.poll_and_execute(address);
}
