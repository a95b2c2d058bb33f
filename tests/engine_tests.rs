//! Scenario tests for the engine, its listeners and persistence.
//!
//! Timer-driven listeners run against Tokio's paused clock, so sleeping in
//! a test advances time deterministically.

use rewind::{
    listener, mount, state_graph, unmount, Cleanup, Composite, Config, ContextPatch, Guard,
    Machine, MemoryStore, Phase, StateStore,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

fn toggle() -> Config<Value> {
    Config::builder()
        .id("toggle")
        .initial("off")
        .context(json!({}))
        .states(state_graph! {
            on => { toggle: off },
            off => { toggle: on },
        })
        .build()
        .unwrap()
}

/// Countdown that ticks once a second while in `countdown` and finishes
/// when the seconds run out.
fn timer(seconds: u64) -> Config<Value> {
    Config::builder()
        .id("timer")
        .initial("idle")
        .context(json!({ "seconds": seconds }))
        .states(state_graph! {
            idle => { start: countdown },
            countdown => { tick: countdown, finish: ringing, stop: idle },
            ringing => { stop: idle },
        })
        .on_change(|state, send| {
            if state.value != "countdown" {
                return Cleanup::none();
            }
            let seconds = state.context["seconds"].as_u64().unwrap_or(0);
            let handle = tokio::spawn(async move {
                sleep(Duration::from_secs(1)).await;
                if seconds > 0 {
                    send.send_with("tick", ContextPatch::value(json!({ "seconds": seconds - 1 })));
                } else {
                    send.send("finish");
                }
            });
            Cleanup::abort(handle)
        })
        .build()
        .unwrap()
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let read = {
        let count = Arc::clone(&count);
        move || count.load(Ordering::SeqCst)
    };
    (count, read)
}

#[tokio::test(start_paused = true)]
async fn toggle_scenario() {
    let (changes, read_changes) = counter();
    let machine = Machine::create(toggle());
    machine.add_event_listener(
        Phase::Change,
        listener(move |_, _| {
            changes.fetch_add(1, Ordering::SeqCst);
            Cleanup::none()
        }),
    );

    assert!(machine.send("toggle"));
    assert_eq!(machine.value(), "on");
    sleep(Duration::from_millis(10)).await;
    assert_eq!(read_changes(), 1);

    let before = machine.state();
    assert!(!machine.send("spin"));
    sleep(Duration::from_millis(10)).await;

    assert_eq!(machine.state(), before);
    assert_eq!(read_changes(), 1);
}

#[tokio::test(start_paused = true)]
async fn countdown_ticks_then_rings() {
    let machine = Machine::create(timer(2));

    machine.send("start");
    assert_eq!(machine.value(), "countdown");

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(machine.value(), "countdown");
    assert_eq!(machine.context()["seconds"], json!(1));

    sleep(Duration::from_secs(1)).await;
    assert_eq!(machine.value(), "countdown");
    assert_eq!(machine.context()["seconds"], json!(0));

    sleep(Duration::from_secs(1)).await;
    assert_eq!(machine.value(), "ringing");
    assert!(!machine.is_done());
    assert_eq!(
        machine.path(),
        vec!["idle", "countdown", "countdown", "countdown", "ringing"]
    );

    machine.destroy().await;
}

#[tokio::test(start_paused = true)]
async fn stopping_countdown_cancels_pending_tick() {
    let machine = Machine::create(timer(5));

    machine.send("start");
    sleep(Duration::from_millis(500)).await;
    machine.send("stop");

    sleep(Duration::from_secs(3)).await;
    assert_eq!(machine.value(), "idle");
    assert_eq!(machine.path(), vec!["idle", "countdown", "idle"]);
}

#[tokio::test(start_paused = true)]
async fn undo_to_stop_resumes_countdown() {
    let machine = Machine::create(timer(3));

    machine.send("start");
    sleep(Duration::from_millis(1500)).await;
    machine.send("stop");
    sleep(Duration::from_millis(10)).await;

    assert!(machine.history().undo_when(&Guard::event("stop")));
    assert_eq!(machine.value(), "countdown");
    assert_eq!(machine.context()["seconds"], json!(2));

    // Resuming re-arms the timer from the restored node and branches off.
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(machine.context()["seconds"], json!(1));
    assert_eq!(machine.path(), vec!["idle", "countdown", "countdown", "countdown"]);

    machine.destroy().await;
}

#[tokio::test(start_paused = true)]
async fn stale_sends_are_dropped() {
    let config = Config::builder()
        .initial("loading")
        .context(json!({ "page": 0 }))
        .transition("loading", "loaded", "ready")
        .transition("ready", "loadMore", "loading")
        .transition("loading", "cancel", "ready")
        .on_change(|state, send| {
            if state.value == "loading" {
                // No cleanup: the response arrives even if the user moved on.
                tokio::spawn(async move {
                    sleep(Duration::from_secs(1)).await;
                    send.send("loaded");
                });
            }
            Cleanup::none()
        })
        .build()
        .unwrap();

    let feed = Machine::create(config);
    sleep(Duration::from_millis(100)).await;
    feed.send("cancel");
    feed.send("loadMore");

    sleep(Duration::from_millis(950)).await;
    // The first request was bound to the initial node and is dropped; the
    // second is still pending.
    assert_eq!(feed.value(), "loading");
    assert_eq!(feed.path(), vec!["loading", "ready", "loading"]);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(feed.value(), "ready");
}

#[tokio::test(start_paused = true)]
async fn sender_reports_staleness() {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let machine = Machine::create(toggle());
    let sink = Arc::clone(&captured);
    machine.add_event_listener(
        Phase::Change,
        listener(move |_, send| {
            sink.lock().unwrap().push(send);
            Cleanup::none()
        }),
    );

    machine.start();
    sleep(Duration::from_millis(10)).await;
    let first = captured.lock().unwrap().remove(0);
    assert!(!first.is_stale());

    machine.send("toggle");
    assert!(first.is_stale());
    assert!(!first.send("toggle"));
    assert_eq!(machine.value(), "on");
}

/// Change listener that keeps every `Sender` it is handed.
fn capture_senders(machine: &Machine<Value>) -> Arc<Mutex<Vec<rewind::Sender<Value>>>> {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    machine.add_event_listener(
        Phase::Change,
        listener(move |_, send| {
            sink.lock().unwrap().push(send);
            Cleanup::none()
        }),
    );
    captured
}

#[tokio::test(start_paused = true)]
async fn sends_from_before_a_reset_are_dropped() {
    let machine = Machine::create(toggle());
    let captured = capture_senders(&machine);

    machine.send("toggle");
    sleep(Duration::from_millis(10)).await;
    let before_reset = captured.lock().unwrap().pop().unwrap();

    machine.history().reset();
    let reset = machine.state();

    assert!(!before_reset.send("toggle"));
    assert_eq!(machine.state(), reset);
    assert_eq!(machine.path(), vec!["off"]);
}

#[tokio::test(start_paused = true)]
async fn sends_from_before_a_remount_are_dropped() {
    let memory = MemoryStore::new();
    let store: &dyn StateStore<Value> = &memory;

    let earlier = Machine::create(toggle());
    earlier.send("toggle");
    unmount(&earlier, Some(store)).await;

    let machine = Machine::create(toggle());
    let captured = capture_senders(&machine);
    machine.start();
    sleep(Duration::from_millis(10)).await;
    let before_mount = captured.lock().unwrap().pop().unwrap();

    mount(&machine, Some(store));
    let restored = machine.state();
    assert_eq!(restored.value, "on");

    assert!(!before_mount.send("toggle"));
    assert_eq!(machine.state(), restored);
    assert_eq!(machine.path(), vec!["off", "on"]);
}

#[tokio::test(start_paused = true)]
async fn listener_invocations_never_overlap() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let machine = Machine::create(toggle());
    let sink = Arc::clone(&log);
    machine.add_event_listener(
        Phase::Change,
        listener(move |state, _| {
            sink.lock().unwrap().push(format!("invoke {}", state.value));
            let sink = Arc::clone(&sink);
            Cleanup::future(move || async move {
                sleep(Duration::from_millis(100)).await;
                sink.lock().unwrap().push("cleanup".to_string());
            })
        }),
    );

    machine.send("toggle");
    machine.send("toggle");
    machine.send("toggle");
    sleep(Duration::from_secs(1)).await;

    let log = log.lock().unwrap().clone();
    assert_eq!(log.len(), 5);
    for (index, entry) in log.iter().enumerate() {
        if index % 2 == 0 {
            assert!(entry.starts_with("invoke"), "{log:?}");
        } else {
            assert_eq!(entry, "cleanup", "{log:?}");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn deferred_cleanup_is_awaited_before_reinvoking() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let machine = Machine::create(toggle());
    let sink = Arc::clone(&log);
    machine.add_event_listener(
        Phase::Change,
        listener(move |_, _| {
            sink.lock().unwrap().push("invoke");
            let sink = Arc::clone(&sink);
            Cleanup::deferred(async move {
                sleep(Duration::from_millis(50)).await;
                Cleanup::sync(move || sink.lock().unwrap().push("cleanup"))
            })
        }),
    );

    machine.send("toggle");
    sleep(Duration::from_millis(10)).await;
    machine.send("toggle");
    sleep(Duration::from_millis(200)).await;

    assert_eq!(*log.lock().unwrap(), vec!["invoke", "cleanup", "invoke"]);
}

#[tokio::test(start_paused = true)]
async fn phases_follow_the_active_node() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = |phase: Phase| {
        let seen = Arc::clone(&seen);
        listener(move |state: &rewind::MachineState<Value>, _| {
            seen.lock().unwrap().push(format!("{phase} {}", state.value));
            Cleanup::none()
        })
    };

    let config = Config::builder()
        .initial("loading")
        .context(json!({}))
        .transition("loading", "loaded", "done")
        .terminal("done")
        .on(Phase::Start, record(Phase::Start))
        .on(Phase::Done, record(Phase::Done))
        .build()
        .unwrap();

    let machine = Machine::create(config);
    sleep(Duration::from_millis(10)).await;
    machine.send("loaded");
    sleep(Duration::from_millis(10)).await;
    machine.history().reset();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["onStart loading", "onDone done", "onStart loading"]
    );
}

#[tokio::test(start_paused = true)]
async fn start_listener_skips_a_restored_node() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let config = Arc::new(
        Config::builder()
            .id("feed")
            .initial("loading")
            .context(json!({}))
            .transition("loading", "loaded", "ready")
            .transition("ready", "refresh", "loading")
            .on_start(move |state, _| {
                sink.lock().unwrap().push(format!("{} initial={}", state.value, state.is_initial()));
                Cleanup::none()
            })
            .build()
            .unwrap(),
    );

    let memory = MemoryStore::new();
    let store: &dyn StateStore<Value> = &memory;
    let earlier = Machine::create(Arc::clone(&config));
    sleep(Duration::from_millis(10)).await;
    earlier.send("loaded");
    sleep(Duration::from_millis(10)).await;
    unmount(&earlier, Some(store)).await;
    assert_eq!(*seen.lock().unwrap(), vec!["loading initial=true"]);

    let machine = Machine::create(config);
    mount(&machine, Some(store));
    sleep(Duration::from_millis(10)).await;

    assert_eq!(machine.value(), "ready");
    assert_eq!(*seen.lock().unwrap(), vec!["loading initial=true"]);
}

#[tokio::test(start_paused = true)]
async fn done_listener_skips_a_node_left_before_dispatch() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = |phase: Phase| {
        let seen = Arc::clone(&seen);
        listener(move |state: &rewind::MachineState<Value>, _| {
            seen.lock().unwrap().push(format!("{phase} {} done={}", state.value, state.done));
            Cleanup::none()
        })
    };

    let config = Config::builder()
        .initial("loading")
        .context(json!({}))
        .transition("loading", "loaded", "done")
        .terminal("done")
        .on(Phase::Start, record(Phase::Start))
        .on(Phase::Done, record(Phase::Done))
        .build()
        .unwrap();

    let machine = Machine::create(config);
    sleep(Duration::from_millis(10)).await;

    machine.send("loaded");
    assert!(machine.history().undo());
    sleep(Duration::from_millis(10)).await;

    assert_eq!(machine.value(), "loading");
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["onStart loading done=false", "onStart loading done=false"]
    );
}

#[tokio::test(start_paused = true)]
async fn destroy_runs_each_pending_cleanup_once() {
    let (cleanups, read_cleanups) = counter();
    let cleanup_listener = || {
        let cleanups = Arc::clone(&cleanups);
        listener(move |_: &rewind::MachineState<Value>, _| {
            let cleanups = Arc::clone(&cleanups);
            Cleanup::sync(move || {
                cleanups.fetch_add(1, Ordering::SeqCst);
            })
        })
    };

    let machine = Machine::create(toggle());
    machine.add_event_listener(Phase::Change, cleanup_listener());
    machine.add_event_listener(Phase::Change, cleanup_listener());
    machine.add_event_listener(Phase::Start, cleanup_listener());
    machine.start();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(read_cleanups(), 0);

    machine.destroy().await;
    assert_eq!(read_cleanups(), 3);
    assert!(machine.is_stopped());

    assert!(!machine.send("toggle"));
    machine.destroy().await;
    assert_eq!(read_cleanups(), 3);
}

#[tokio::test(start_paused = true)]
async fn removed_listener_is_torn_down_and_silenced() {
    let (invocations, read_invocations) = counter();
    let (cleanups, read_cleanups) = counter();
    let watcher = listener(move |_: &rewind::MachineState<Value>, _| {
        invocations.fetch_add(1, Ordering::SeqCst);
        let cleanups = Arc::clone(&cleanups);
        Cleanup::sync(move || {
            cleanups.fetch_add(1, Ordering::SeqCst);
        })
    });

    let machine = Machine::create(toggle());
    machine.add_event_listener(Phase::Change, Arc::clone(&watcher));
    machine.send("toggle");
    sleep(Duration::from_millis(10)).await;

    machine.remove_event_listener(Phase::Change, &watcher);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(read_cleanups(), 1);

    machine.send("toggle");
    sleep(Duration::from_millis(10)).await;
    assert_eq!(read_invocations(), 1);
}

#[tokio::test(start_paused = true)]
async fn start_refires_change_without_new_node() {
    let (changes, read_changes) = counter();
    let machine = Machine::create(toggle());
    machine.add_event_listener(
        Phase::Change,
        listener(move |_, _| {
            changes.fetch_add(1, Ordering::SeqCst);
            Cleanup::none()
        }),
    );

    machine.stop();
    assert!(!machine.send("toggle"));
    machine.start();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(read_changes(), 1);
    assert_eq!(machine.path(), vec!["off"]);
}

#[tokio::test(start_paused = true)]
async fn composite_broadcasts_listeners() {
    let (changes, read_changes) = counter();
    let car = Composite::from_configs("car", [("left", toggle()), ("right", timer(1))]).unwrap();
    car.add_event_listener(
        Phase::Change,
        listener(move |_, _| {
            changes.fetch_add(1, Ordering::SeqCst);
            Cleanup::none()
        }),
    );

    assert!(car.send("toggle"));
    sleep(Duration::from_millis(10)).await;

    assert_eq!(read_changes(), 1);
    assert_eq!(car.member("left").unwrap().value(), "on");
    assert_eq!(car.member("right").unwrap().value(), "idle");

    car.destroy().await;
    assert!(car.members().all(|(_, machine)| machine.is_stopped()));
}

#[tokio::test(start_paused = true)]
async fn countdown_survives_remount() {
    let memory = MemoryStore::new();
    let store: &dyn StateStore<Value> = &memory;

    let first = Machine::create(timer(5));
    mount(&first, Some(store));
    first.send("start");
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(first.context()["seconds"], json!(3));
    unmount(&first, Some(store)).await;

    // Nothing ticks while unmounted.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(first.context()["seconds"], json!(3));

    let second = Machine::create(timer(5));
    mount(&second, Some(store));
    assert_eq!(second.value(), "countdown");
    assert_eq!(second.context()["seconds"], json!(3));

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(second.context()["seconds"], json!(2));
    second.destroy().await;
}

#[test]
fn machines_run_without_a_runtime() {
    let machine = Machine::create(toggle());
    assert!(machine.send("toggle"));
    assert!(machine.history().undo());
    assert!(machine.history().redo());
    assert_eq!(machine.value(), "on");
}

#[test]
fn redo_when_checks_the_active_node() {
    let machine = Machine::create(toggle());
    machine.send("toggle");
    machine.send("toggle");
    machine.history().undo();
    machine.history().undo();

    assert!(!machine.history().redo_when(&Guard::value("on")));
    assert_eq!(machine.value(), "off");
    assert!(machine.history().redo_when(&Guard::value("off")));
    assert_eq!(machine.value(), "on");
    assert!(!machine.history().redo_when(&Guard::value("off")));
    assert_eq!(machine.value(), "on");
}

#[test]
fn composite_history_broadcasts_every_direction() {
    let car = Composite::from_configs("car", [("left", toggle()), ("right", timer(1))]).unwrap();
    let left = || car.member("left").unwrap().value();
    car.send("toggle");
    car.send("toggle");
    assert_eq!(car.member("left").unwrap().path(), vec!["off", "on", "off"]);

    assert!(car.history().rewind());
    assert_eq!(left(), "on");
    assert!(car.history().rewind());
    assert_eq!(left(), "off");
    assert!(!car.history().rewind());

    assert!(car.history().fast_forward());
    assert_eq!(left(), "on");
    assert!(car.history().redo());
    assert_eq!(left(), "off");
    assert!(!car.history().redo());
    assert!(!car.history().fast_forward());

    assert_eq!(car.member("right").unwrap().path(), vec!["idle"]);
}
