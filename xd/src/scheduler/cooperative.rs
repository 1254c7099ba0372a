//! Cooperative scheduler: one host timer per binding

use std::sync::Arc;

use tracing::{debug, info};

use crate::dispatch::{Receiver, Sender};

use super::binding::{Binding, Role};
use super::timer::{TimerCallback, TimerHost, TimerId};
use super::{Mode, Scheduler, SchedulerError, receive_tick, send_tick};

/// Registers each binding as a periodic callback with the host
///
/// Callbacks run to completion on whatever thread drives the host, so no two
/// bindings ever run at the same time.
pub struct CooperativeScheduler {
    host: Arc<dyn TimerHost>,
    bindings: Vec<Binding>,
    sender: Sender,
    receiver: Receiver,
    registered: Vec<TimerId>,
    running: bool,
}

impl CooperativeScheduler {
    pub fn new(host: Arc<dyn TimerHost>, bindings: Vec<Binding>, sender: Sender, receiver: Receiver) -> Self {
        debug!(bindings = bindings.len(), "CooperativeScheduler::new: called");
        Self {
            host,
            bindings,
            sender,
            receiver,
            registered: Vec::new(),
            running: false,
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    fn callback_for(&self, binding: &Binding) -> TimerCallback {
        let address = binding.address.clone();
        match binding.role {
            Role::Receive => {
                let receiver = self.receiver.clone();
                Box::new(move || receive_tick(&receiver, &address))
            }
            Role::Send => {
                let sender = self.sender.clone();
                let payload = binding.payload.clone();
                Box::new(move || send_tick(&sender, &address, payload.as_deref()))
            }
        }
    }
}

impl Scheduler for CooperativeScheduler {
    fn start(&mut self) -> Result<(), SchedulerError> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        for binding in &self.bindings {
            let callback = self.callback_for(binding);
            let id = self.host.register_periodic(callback, binding.period());
            debug!(?id, role = ?binding.role, address = %binding.address, period_ms = binding.period_ms, "Registered binding");
            self.registered.push(id);
        }

        self.running = true;
        info!(lanes = self.registered.len(), "CooperativeScheduler started");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SchedulerError> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        for id in self.registered.drain(..) {
            self.host.deregister(id);
        }
        self.running = false;

        info!("CooperativeScheduler stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn mode(&self) -> Mode {
        Mode::Cooperative
    }
}

impl Drop for CooperativeScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Address, Side};
    use crate::scheduler::TimerWheel;
    use crate::script::Interpreter;
    use keystore::{MemoryStore, StoreExt};
    use std::time::Duration;

    fn scheduler(bindings: Vec<Binding>) -> (Arc<MemoryStore>, Arc<TimerWheel>, CooperativeScheduler) {
        let store = Arc::new(MemoryStore::new());
        let wheel = Arc::new(TimerWheel::new());
        let sender = Sender::new(store.clone(), Side::Py);
        let receiver = Receiver::new(store.clone(), Side::Py, Interpreter::standard());
        let scheduler = CooperativeScheduler::new(wheel.clone(), bindings, sender, receiver);
        (store, wheel, scheduler)
    }

    #[test]
    fn test_start_registers_each_binding() {
        let (_, wheel, mut scheduler) = scheduler(crate::scheduler::default_bindings());
        scheduler.start().unwrap();
        assert_eq!(wheel.len(), 4);
        assert!(scheduler.is_running());
        assert!(matches!(scheduler.start(), Err(SchedulerError::AlreadyRunning)));
    }

    #[test]
    fn test_stop_deregisters() {
        let (_, wheel, mut scheduler) = scheduler(crate::scheduler::default_bindings());
        scheduler.start().unwrap();
        scheduler.stop().unwrap();
        assert!(wheel.is_empty());
        assert!(!scheduler.is_running());
        assert!(matches!(scheduler.stop(), Err(SchedulerError::NotRunning)));
    }

    #[test]
    fn test_drop_deregisters() {
        let (_, wheel, mut scheduler) = scheduler(crate::scheduler::default_bindings());
        scheduler.start().unwrap();
        drop(scheduler);
        assert!(wheel.is_empty());
    }

    #[test]
    fn test_send_lane_posts_fixed_payload() {
        let (store, wheel, mut scheduler) = scheduler(vec![Binding::send("1", 16, Some("print(2)"))]);
        scheduler.start().unwrap();

        wheel.advance(Duration::from_millis(16));
        assert_eq!(store.get_string("__lua_registry1").unwrap().as_deref(), Some("print(2)"));
        assert!(store.get_bool("__lua_dispatch1").unwrap());
    }

    #[test]
    fn test_receive_lane_consumes() {
        let (store, wheel, mut scheduler) = scheduler(vec![Binding::receive("2", 16)]);
        scheduler.start().unwrap();

        Sender::new(store.clone(), Side::Lua)
            .dispatch(&Address::from("2"), Some("print(\"x\")"))
            .unwrap();
        wheel.advance(Duration::from_millis(16));

        assert!(!store.get_bool("__py_dispatch2").unwrap());
        assert_eq!(scheduler.receiver.stats().executed, 1);
    }

    #[test]
    fn test_no_bindings_still_starts() {
        let (_, wheel, mut scheduler) = scheduler(Vec::new());
        scheduler.start().unwrap();
        assert!(scheduler.is_running());
        assert!(wheel.is_empty());
        assert_eq!(scheduler.mode(), Mode::Cooperative);
    }
}
