//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::channel::Side;
use crate::scheduler::Mode;

/// Crossdispatch - cross-runtime code dispatch over a shared store
#[derive(Parser, Debug)]
#[command(
    name = "xd",
    author,
    version,
    about = "Exchange and execute code snippets between two runtimes through a shared key-value store",
    long_about = None
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Override the store document path
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Override which end of the bridge this process is
    #[arg(short, long, global = true, value_enum)]
    pub side: Option<Side>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scheduler until interrupted
    Run {
        /// Override the scheduling backend
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,
    },

    /// Dispatch one payload to the peer side
    Send {
        /// Channel address (empty for the primary channel)
        #[arg(short, long, default_value = "")]
        address: String,

        /// Payload to send (heartbeat if omitted)
        #[arg(short, long)]
        payload: Option<String>,
    },

    /// Run one receive pass on the local side
    Poll {
        /// Channel address (empty for the primary channel)
        #[arg(short, long, default_value = "")]
        address: String,
    },

    /// Show both channels of an address
    Status {
        /// Channel address (empty for the primary channel)
        #[arg(short, long, default_value = "")]
        address: String,
    },

    /// List every field in the store
    Fields,
}
