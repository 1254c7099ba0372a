//! Crossdispatch - cross-runtime code dispatch over a shared key-value store
//!
//! Two independently running runtimes ("py" and "lua") hand each other code
//! snippets through named fields of a shared store. There is no direct call
//! interface: one side writes a payload and raises a ready flag, the other
//! polls, runs the payload, and lowers the flag.
//!
//! # Core Concepts
//!
//! - **Channel**: a payload field plus a ready flag, per consumer side and
//!   address, e.g. `__lua_registry1` / `__lua_dispatch1`
//! - **Dispatch**: post a payload and raise the flag; last write wins
//! - **Receive**: take the payload, lower the flag, execute; failures are
//!   logged and contained
//! - **Scheduler**: drives receives and sends at fixed periods, cooperatively
//!   on a host timer or on one background thread
//!
//! # Modules
//!
//! - [`channel`] - address resolution and atomic channel slots
//! - [`dispatch`] - Sender and Receiver
//! - [`script`] - payload parsing and builtin execution
//! - [`scheduler`] - cooperative and threaded schedulers
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod channel;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod scheduler;
pub mod script;

// Re-export commonly used types
pub use channel::{Address, Channel, ChannelFields, ChannelState, ResolvedAddress, Side, resolve};
pub use config::{Config, StoreBackend, StoreConfig, ThreadedConfig};
pub use dispatch::{PollOutcome, Receiver, Sender, StatsSnapshot, heartbeat_payload};
pub use scheduler::{
    Binding, CooperativeScheduler, Mode, Role, Scheduler, SchedulerError, ThreadedScheduler, TimerHost, TimerId,
    TimerWheel, default_bindings,
};
pub use script::{Builtin, Command, ExecContext, Interpreter, ScriptError};
