//! Host timer facility for cooperative scheduling

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

/// Callback run by the host on each period
pub type TimerCallback = Box<dyn FnMut() + Send>;

/// Handle returned by [`TimerHost::register_periodic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// A host that runs periodic callbacks on its own control thread
pub trait TimerHost: Send + Sync {
    /// Run `callback` every `period` until deregistered
    fn register_periodic(&self, callback: TimerCallback, period: Duration) -> TimerId;

    /// Stop a timer; returns false if it was not registered
    fn deregister(&self, id: TimerId) -> bool;
}

struct Timer {
    period: Duration,
    next_due: Duration,
    /// Taken while the callback runs so the lock is not held
    callback: Option<TimerCallback>,
}

#[derive(Default)]
struct WheelInner {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerId, Timer>,
}

/// Virtual-clock timer host driven by whoever owns the control thread
///
/// Nothing fires until [`TimerWheel::advance`] or [`TimerWheel::run_due`] is
/// called; callbacks then run on the calling thread, one at a time. A timer
/// that fell several periods behind fires once and is rescheduled one period
/// from the current time, like a frame-driven host timer.
#[derive(Default)]
pub struct TimerWheel {
    inner: Mutex<WheelInner>,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WheelInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Virtual time elapsed since creation
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of registered timers
    pub fn len(&self) -> usize {
        self.lock().timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time until the earliest timer is due, if any are registered
    pub fn next_deadline(&self) -> Option<Duration> {
        let inner = self.lock();
        inner
            .timers
            .values()
            .map(|t| t.next_due.saturating_sub(inner.now))
            .min()
    }

    /// Move the clock forward and fire whatever became due
    pub fn advance(&self, elapsed: Duration) -> usize {
        self.lock().now += elapsed;
        self.run_due()
    }

    /// Fire every timer due at the current time, earliest first; returns how
    /// many fired
    pub fn run_due(&self) -> usize {
        let now = self.now();
        let mut due: Vec<(Duration, TimerId)> = {
            let inner = self.lock();
            inner
                .timers
                .iter()
                .filter(|(_, t)| t.next_due <= now)
                .map(|(id, t)| (t.next_due, *id))
                .collect()
        };
        due.sort();

        let mut fired = 0;
        for (_, id) in due {
            // Callbacks may deregister other timers, including this one
            let callback = {
                let mut inner = self.lock();
                match inner.timers.get_mut(&id) {
                    Some(timer) => timer.callback.take(),
                    None => None,
                }
            };
            let Some(mut callback) = callback else {
                continue;
            };

            callback();
            fired += 1;

            let mut inner = self.lock();
            if let Some(timer) = inner.timers.get_mut(&id) {
                timer.next_due = now + timer.period;
                timer.callback = Some(callback);
            }
        }

        if fired > 0 {
            debug!(fired, now_ms = now.as_millis() as u64, "TimerWheel::run_due: fired timers");
        }
        fired
    }
}

impl TimerHost for TimerWheel {
    fn register_periodic(&self, callback: TimerCallback, period: Duration) -> TimerId {
        let mut inner = self.lock();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        let next_due = inner.now + period;
        inner.timers.insert(
            id,
            Timer {
                period,
                next_due,
                callback: Some(callback),
            },
        );
        debug!(?id, period_ms = period.as_millis() as u64, "TimerWheel: registered");
        id
    }

    fn deregister(&self, id: TimerId) -> bool {
        let removed = self.lock().timers.remove(&id).is_some();
        debug!(?id, removed, "TimerWheel: deregistered");
        removed
    }
}
