//! Integration tests for crossdispatch
//!
//! These tests drive both sides of the bridge through a shared store, over
//! the in-memory and the file backends.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossdispatch::script::Arg;
use crossdispatch::{
    Address, Binding, Builtin, Channel, CooperativeScheduler, ExecContext, Interpreter, PollOutcome, Receiver,
    Scheduler, ScriptError, Sender, Side, ThreadedScheduler, TimerWheel,
};
use keystore::{FileStore, KeyValueStore, MemoryStore, StoreExt};
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

/// `record(tag)` - remembers every tag it is called with
#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<AtomicUsize>,
    tags: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tags(&self) -> Vec<String> {
        self.tags.lock().unwrap().clone()
    }
}

impl Builtin for Recorder {
    fn name(&self) -> &'static str {
        "record"
    }

    fn call(&self, args: &[Arg], _ctx: &mut ExecContext<'_>) -> Result<(), ScriptError> {
        let tag = args.first().map(Arg::to_string).unwrap_or_default();
        self.tags.lock().unwrap().push(tag);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn recording_receiver(store: Arc<dyn KeyValueStore>, side: Side) -> (Receiver, Recorder) {
    let recorder = Recorder::default();
    let mut interpreter = Interpreter::standard();
    interpreter.register(Box::new(recorder.clone()));
    (Receiver::new(store, side, interpreter), recorder)
}

/// One memory store and one file store; the TempDir keeps the file alive
fn backends() -> Vec<(Option<TempDir>, Arc<dyn KeyValueStore>)> {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let file: Arc<dyn KeyValueStore> =
        Arc::new(FileStore::open(temp.path().join("store.json")).expect("Failed to open file store"));
    let memory: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    vec![(None, memory), (Some(temp), file)]
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

// =============================================================================
// Channel Protocol Tests
// =============================================================================

#[test]
fn test_fresh_channel_is_idle() {
    for (_guard, store) in backends() {
        let (receiver, recorder) = recording_receiver(store.clone(), Side::Lua);

        assert!(!receiver.peek(&Address::primary()).unwrap().ready);
        assert!(matches!(receiver.poll_and_execute(&Address::primary()), PollOutcome::Idle));
        assert_eq!(recorder.count(), 0);
        assert!(store.snapshot().unwrap().is_empty(), "idle poll must not write");
    }
}

#[test]
fn test_dispatch_raises_flag_with_payload() {
    for (_guard, store) in backends() {
        let sender = Sender::new(store.clone(), Side::Py);
        sender.dispatch(&Address::new("1"), Some("record(\"a\")")).unwrap();

        assert_eq!(store.get_string("__lua_registry1").unwrap().as_deref(), Some("record(\"a\")"));
        assert!(store.get_bool("__lua_dispatch1").unwrap());
        assert!(!store.get_bool("__py_dispatch1").unwrap());
    }
}

#[test]
fn test_payload_executes_exactly_once() {
    for (_guard, store) in backends() {
        let sender = Sender::new(store.clone(), Side::Py);
        let (receiver, recorder) = recording_receiver(store.clone(), Side::Lua);
        let address = Address::primary();

        sender.dispatch(&address, Some("record(\"once\")")).unwrap();

        assert!(matches!(receiver.poll_and_execute(&address), PollOutcome::Executed { .. }));
        assert!(matches!(receiver.poll_and_execute(&address), PollOutcome::Idle));
        assert!(matches!(receiver.poll_and_execute(&address), PollOutcome::Idle));

        assert_eq!(recorder.count(), 1);
        assert!(!store.get_bool("__lua_dispatch").unwrap());
        let stats = receiver.stats();
        assert_eq!(stats.executed, 1);
        assert_eq!(stats.idle, 2);
    }
}

#[test]
fn test_last_write_wins_before_poll() {
    for (_guard, store) in backends() {
        let sender = Sender::new(store.clone(), Side::Py);
        let (receiver, recorder) = recording_receiver(store.clone(), Side::Lua);
        let address = Address::new("1");

        sender.dispatch(&address, Some("record(\"x\")")).unwrap();
        sender.dispatch(&address, Some("record(\"y\")")).unwrap();
        receiver.poll_and_execute(&address);

        assert_eq!(recorder.tags(), vec!["y".to_string()]);
    }
}

#[test]
fn test_channels_are_independent() {
    for (_guard, store) in backends() {
        let sender = Sender::new(store.clone(), Side::Py);
        let (receiver, recorder) = recording_receiver(store.clone(), Side::Lua);

        sender.dispatch(&Address::new("1"), Some("record(\"one\")")).unwrap();

        assert!(matches!(receiver.poll_and_execute(&Address::primary()), PollOutcome::Idle));
        assert!(matches!(receiver.poll_and_execute(&Address::new("2")), PollOutcome::Idle));
        assert!(receiver.peek(&Address::new("1")).unwrap().ready);

        receiver.poll_and_execute(&Address::new("1"));
        assert_eq!(recorder.tags(), vec!["one".to_string()]);
    }
}

#[test]
fn test_round_trip_both_directions() {
    for (_guard, store) in backends() {
        let py_sender = Sender::new(store.clone(), Side::Py);
        let lua_sender = Sender::new(store.clone(), Side::Lua);
        let (py_receiver, py_recorder) = recording_receiver(store.clone(), Side::Py);
        let (lua_receiver, lua_recorder) = recording_receiver(store.clone(), Side::Lua);
        let address = Address::new("2");

        for round in 0..2 {
            py_sender.dispatch(&address, Some(&format!("record(\"to lua {}\")", round))).unwrap();
            lua_receiver.poll_and_execute(&address);

            lua_sender.dispatch(&address, Some(&format!("record(\"to py {}\")", round))).unwrap();
            py_receiver.poll_and_execute(&address);
        }

        assert_eq!(lua_recorder.tags(), vec!["to lua 0", "to lua 1"]);
        assert_eq!(py_recorder.tags(), vec!["to py 0", "to py 1"]);
    }
}

#[test]
fn test_identical_payload_runs_once_per_dispatch() {
    for (_guard, store) in backends() {
        let sender = Sender::new(store.clone(), Side::Py);
        let (receiver, recorder) = recording_receiver(store.clone(), Side::Lua);
        let address = Address::new("1");

        for _ in 0..2 {
            sender.dispatch(&address, Some("record(\"X\")")).unwrap();
            assert!(receiver.peek(&address).unwrap().ready);
            assert!(matches!(receiver.poll_and_execute(&address), PollOutcome::Executed { .. }));
        }
        assert!(matches!(receiver.poll_and_execute(&address), PollOutcome::Idle));

        assert_eq!(recorder.tags(), vec!["X", "X"]);
        assert_eq!(receiver.stats().executed, 2);
    }
}

#[test]
fn test_failed_payload_is_consumed_and_next_runs() {
    for (_guard, store) in backends() {
        let sender = Sender::new(store.clone(), Side::Lua);
        let (receiver, recorder) = recording_receiver(store.clone(), Side::Py);
        let address = Address::primary();

        sender.dispatch(&address, Some("record(\"before\"); error(\"boom\"); record(\"after\")")).unwrap();
        match receiver.poll_and_execute(&address) {
            PollOutcome::Failed { error, .. } => assert_eq!(error, ScriptError::Raised("boom".to_string())),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!receiver.peek(&address).unwrap().ready);

        sender.dispatch(&address, Some("record(\"next\")")).unwrap();
        assert!(matches!(receiver.poll_and_execute(&address), PollOutcome::Executed { .. }));

        assert_eq!(recorder.tags(), vec!["before", "next"]);
        assert_eq!(receiver.stats().failed, 1);
    }
}

#[test]
fn test_heartbeat_reaches_peer() {
    for (_guard, store) in backends() {
        let sender = Sender::new(store.clone(), Side::Lua);
        let receiver = Receiver::new(store.clone(), Side::Py, Interpreter::standard());

        sender.dispatch(&Address::primary(), None).unwrap();
        match receiver.poll_and_execute(&Address::primary()) {
            PollOutcome::Executed { output } => {
                assert_eq!(output.len(), 1);
                assert!(output[0].starts_with("hello from lua, time: "));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}

// =============================================================================
// File Store Tests
// =============================================================================

#[test]
fn test_two_handles_share_one_document() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("shared").join("store.json");

    // Separate handles stand in for separate processes
    let py_store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
    let lua_store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());

    Sender::new(py_store.clone(), Side::Py)
        .dispatch(&Address::new("1"), Some("record(\"across\")"))
        .unwrap();

    let (receiver, recorder) = recording_receiver(lua_store, Side::Lua);
    receiver.poll_and_execute(&Address::new("1"));

    assert_eq!(recorder.tags(), vec!["across"]);
    assert!(!py_store.get_bool("__lua_dispatch1").unwrap());
}

#[test]
fn test_corrupt_document_skips_tick() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("store.json");
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
    let (receiver, recorder) = recording_receiver(store.clone(), Side::Py);

    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(receiver.poll_and_execute(&Address::primary()), PollOutcome::Skipped(_)));
    assert_eq!(receiver.stats().skipped, 1);

    fs::write(&path, "{}").unwrap();
    Sender::new(store, Side::Lua)
        .dispatch(&Address::primary(), Some("record(\"recovered\")"))
        .unwrap();
    assert!(matches!(receiver.poll_and_execute(&Address::primary()), PollOutcome::Executed { .. }));
    assert_eq!(recorder.tags(), vec!["recovered"]);
}

// =============================================================================
// Scheduler Tests
// =============================================================================

#[test]
fn test_cooperative_schedulers_exchange_payloads() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let wheel = Arc::new(TimerWheel::new());

    let (py_receiver, py_recorder) = recording_receiver(store.clone(), Side::Py);
    let (lua_receiver, lua_recorder) = recording_receiver(store.clone(), Side::Lua);

    let mut py = CooperativeScheduler::new(
        wheel.clone(),
        vec![
            Binding::send("1", 16, Some("record(\"ping\")")),
            Binding::receive("2", 16),
        ],
        Sender::new(store.clone(), Side::Py),
        py_receiver,
    );
    let mut lua = CooperativeScheduler::new(
        wheel.clone(),
        vec![
            Binding::receive("1", 16),
            Binding::send("2", 16, Some("record(\"pong\")")),
        ],
        Sender::new(store.clone(), Side::Lua),
        lua_receiver,
    );

    py.start().unwrap();
    lua.start().unwrap();
    for _ in 0..10 {
        wheel.advance(Duration::from_millis(16));
    }
    py.stop().unwrap();
    lua.stop().unwrap();

    assert!(wheel.is_empty());
    assert!(lua_recorder.count() >= 5, "lua ran {} pings", lua_recorder.count());
    assert!(py_recorder.count() >= 5, "py ran {} pongs", py_recorder.count());
    assert!(lua_recorder.tags().iter().all(|t| t == "ping"));
    assert!(py_recorder.tags().iter().all(|t| t == "pong"));

    // Nothing runs once both are stopped
    let before = lua_recorder.count();
    wheel.advance(Duration::from_millis(100));
    assert_eq!(lua_recorder.count(), before);
}

#[test]
fn test_threaded_schedulers_exchange_heartbeats() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let interval = Duration::from_millis(5);

    let py_receiver = Receiver::new(store.clone(), Side::Py, Interpreter::standard());
    let lua_receiver = Receiver::new(store.clone(), Side::Lua, Interpreter::standard());

    let mut py = ThreadedScheduler::new(interval, Sender::new(store.clone(), Side::Py), py_receiver.clone());
    let mut lua = ThreadedScheduler::new(interval, Sender::new(store.clone(), Side::Lua), lua_receiver.clone());

    py.start().unwrap();
    lua.start().unwrap();

    assert!(wait_for(|| py_receiver.stats().executed >= 2 && lua_receiver.stats().executed >= 2));

    py.stop().unwrap();
    lua.stop().unwrap();
    assert!(!py.is_running());
    assert!(!lua.is_running());
    assert_eq!(py_receiver.stats().failed, 0);
    assert_eq!(lua_receiver.stats().failed, 0);
}

#[test]
fn test_channel_post_and_take_directly() {
    let store = MemoryStore::new();
    let channel = Channel::new(Side::Py, Address::new("7"));

    channel.post(&store, "record(\"direct\")").unwrap();
    assert!(channel.state(&store).unwrap().is_pending());

    assert_eq!(channel.take(&store).unwrap().as_deref(), Some("record(\"direct\")"));
    assert_eq!(channel.take(&store).unwrap(), None);
}
