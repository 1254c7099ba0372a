//! Dispatch handshake
//!
//! A [`Sender`] posts a payload to the peer's channel and raises its ready
//! flag. The peer's [`Receiver`] takes the payload, lowers the flag, and runs
//! the payload in its local interpreter.
//!
//! Per channel the only states are idle (`ready=false`) and pending
//! (`ready=true`). `dispatch` moves idle or pending to pending; a receive pass
//! moves pending to idle. Last write wins: a second dispatch before the peer
//! polls replaces the first payload.

mod receiver;
mod sender;
mod stats;

pub use receiver::{PollOutcome, Receiver};
pub use sender::{HEARTBEAT_TIME_FORMAT, Sender, heartbeat_payload};
pub use stats::{DispatchStats, StatsSnapshot};
