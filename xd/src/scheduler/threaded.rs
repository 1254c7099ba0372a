//! Threaded scheduler: a background receive-then-send loop

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

use crate::channel::Address;
use crate::dispatch::{Receiver, Sender};

use super::{Mode, Scheduler, SchedulerError, receive_tick, send_tick};

/// Runs the primary channel's cycle on a dedicated thread
///
/// Each iteration sleeps `interval`, polls the local channel, then posts a
/// heartbeat to the peer. The sleep doubles as the stop signal wait, so
/// [`Scheduler::stop`] returns within one interval plus one cycle.
pub struct ThreadedScheduler {
    interval: Duration,
    address: Address,
    sender: Sender,
    receiver: Receiver,
    ticks: Arc<AtomicU64>,
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadedScheduler {
    pub fn new(interval: Duration, sender: Sender, receiver: Receiver) -> Self {
        debug!(?interval, "ThreadedScheduler::new: called");
        Self {
            interval,
            address: Address::primary(),
            sender,
            receiver,
            ticks: Arc::new(AtomicU64::new(0)),
            stop_tx: None,
            handle: None,
        }
    }

    /// Completed iterations since creation
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Scheduler for ThreadedScheduler {
    fn start(&mut self) -> Result<(), SchedulerError> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = self.interval;
        let address = self.address.clone();
        let sender = self.sender.clone();
        let receiver = self.receiver.clone();
        let ticks = Arc::clone(&self.ticks);

        let handle = thread::Builder::new()
            .name("xd-dispatch".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    receive_tick(&receiver, &address);
                    send_tick(&sender, &address, None);
                    ticks.fetch_add(1, Ordering::Relaxed);
                }
                debug!("ThreadedScheduler: loop exited");
            })
            .map_err(SchedulerError::ThreadSpawn)?;

        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);
        info!(interval_ms = self.interval.as_millis() as u64, "ThreadedScheduler started");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SchedulerError> {
        let Some(handle) = self.handle.take() else {
            return Err(SchedulerError::NotRunning);
        };

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        handle.join().map_err(|_| SchedulerError::ThreadPanicked)?;
        info!(ticks = self.ticks(), "ThreadedScheduler stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    fn mode(&self) -> Mode {
        Mode::Threaded
    }
}

impl Drop for ThreadedScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}
