//! Crossdispatch - cross-runtime code dispatch
//!
//! CLI entry point for running the scheduler and poking at channels.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use keystore::KeyValueStore;
use tracing::{info, warn};

use crossdispatch::cli::{Cli, Command};
use crossdispatch::config::{Config, StoreBackend};
use crossdispatch::{
    Address, Channel, CooperativeScheduler, Interpreter, Mode, PollOutcome, Receiver, Scheduler, Sender, Side,
    ThreadedScheduler, TimerWheel,
};

/// Host loop wait when no timers are registered
const IDLE_WAIT: Duration = Duration::from_millis(100);

fn setup_logging(verbose: bool, log_file: Option<&PathBuf>) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let file = fs::File::create(path).context("Failed to create log file")?;
            tracing_subscriber::fmt()
                .with_writer(file)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
    }

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

// Single-threaded runtime: in cooperative mode every timer callback runs on
// this thread, the way a host application's own timer loop would run them
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_file.as_ref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(side) = cli.side {
        config.side = side;
    }
    if let Some(path) = cli.store {
        config.store.backend = StoreBackend::File;
        config.store.path = Some(path);
    }
    if let Command::Run { mode: Some(mode) } = &cli.command {
        config.mode = *mode;
    }
    config.validate().context("Invalid configuration")?;

    info!(side = %config.side, mode = %config.mode, "crossdispatch loaded config");

    let store = config.store.open()?;

    match cli.command {
        Command::Run { .. } => cmd_run(&config, store).await,
        Command::Send { address, payload } => cmd_send(&config, store, address.into(), payload),
        Command::Poll { address } => cmd_poll(&config, store, address.into()),
        Command::Status { address } => cmd_status(store, address.into()),
        Command::Fields => cmd_fields(store),
    }
}

/// Run the configured scheduler until Ctrl-C
async fn cmd_run(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<()> {
    if config.store.backend == StoreBackend::Memory {
        warn!("Memory store is private to this process; no peer can reach it");
    }

    let sender = Sender::new(Arc::clone(&store), config.side);
    let receiver = Receiver::new(store, config.side, Interpreter::standard());

    println!(
        "{} Running as {} ({} mode), Ctrl-C to stop",
        "▶".green(),
        config.side.to_string().cyan(),
        config.mode
    );

    match config.mode {
        Mode::Cooperative => {
            let wheel = Arc::new(TimerWheel::new());
            let mut scheduler =
                CooperativeScheduler::new(wheel.clone(), config.bindings.clone(), sender, receiver.clone());
            scheduler.start()?;
            let result = drive_host(&wheel).await;
            scheduler.stop()?;
            result?;
        }
        Mode::Threaded => {
            let mut scheduler = ThreadedScheduler::new(config.threaded.interval(), sender, receiver.clone());
            scheduler.start()?;
            let result = tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C");
            scheduler.stop()?;
            result?;
        }
    }

    let stats = receiver.stats();
    println!(
        "{} Stopped: {} executed, {} failed, {} skipped",
        "■".yellow(),
        stats.executed,
        stats.failed,
        stats.skipped
    );
    Ok(())
}

/// Host control loop: fire due timers until Ctrl-C
async fn drive_host(wheel: &TimerWheel) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last = Instant::now();
    loop {
        let wait = wheel.next_deadline().unwrap_or(IDLE_WAIT);
        tokio::select! {
            result = &mut shutdown => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Interrupt received, stopping");
                return Ok(());
            }
            _ = tokio::time::sleep(wait) => {
                let now = Instant::now();
                wheel.advance(now - last);
                last = now;
            }
        }
    }
}

/// Dispatch one payload to the peer
fn cmd_send(config: &Config, store: Arc<dyn KeyValueStore>, address: Address, payload: Option<String>) -> Result<()> {
    let sender = Sender::new(store, config.side);
    sender
        .dispatch(&address, payload.as_deref())
        .context("Failed to dispatch payload")?;

    let channel = Channel::new(sender.target(), address);
    println!(
        "{} Dispatched to {} on {} ({})",
        "✓".green(),
        sender.target().to_string().cyan(),
        channel.address(),
        channel.fields().payload.yellow()
    );
    Ok(())
}

/// One receive pass on the local channel
fn cmd_poll(config: &Config, store: Arc<dyn KeyValueStore>, address: Address) -> Result<()> {
    let receiver = Receiver::new(store, config.side, Interpreter::standard());

    match receiver.poll_and_execute(&address) {
        PollOutcome::Idle => {
            println!("Nothing pending for {} on {}", config.side, address);
        }
        PollOutcome::Executed { output } => {
            for line in output {
                println!("{}", line);
            }
            println!("{} Executed payload on {}", "✓".green(), address);
        }
        PollOutcome::Failed { error, output } => {
            for line in output {
                println!("{}", line);
            }
            println!("{} Payload failed: {}", "✗".red(), error);
        }
        PollOutcome::Skipped(e) => {
            return Err(e).context("Store unavailable");
        }
    }
    Ok(())
}

/// Show both channels of an address
fn cmd_status(store: Arc<dyn KeyValueStore>, address: Address) -> Result<()> {
    println!("Address: {}", address.to_string().cyan());

    for side in [Side::Py, Side::Lua] {
        let channel = Channel::new(side, address.clone());
        let state = channel
            .state(store.as_ref())
            .context(format!("Failed to read {} channel", side))?;

        let flag = if state.ready { "pending".yellow() } else { "idle".dimmed() };
        println!("  to {:<4} {}", side.to_string(), flag);
        println!("    {} = {}", channel.fields().ready.dimmed(), state.ready);
        match state.payload {
            Some(payload) => println!("    {} = {:?}", channel.fields().payload.dimmed(), payload),
            None => println!("    {} = {}", channel.fields().payload.dimmed(), "<unset>".dimmed()),
        }
    }
    Ok(())
}

/// List every field in the store
fn cmd_fields(store: Arc<dyn KeyValueStore>) -> Result<()> {
    let fields = store.snapshot().context("Failed to read store")?;
    if fields.is_empty() {
        println!("No fields found");
        return Ok(());
    }

    for (key, value) in fields {
        println!("{} = {}", key.yellow(), value);
    }
    Ok(())
}
