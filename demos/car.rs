//! Car Dashboard
//!
//! This demo groups four independent levers into one composite and drives
//! them through a single handle.
//!
//! Key concepts:
//! - Broadcasting events to every member (only members that define the
//!   event move)
//! - A member with its own timed side effect (the wiper wash cycle)
//! - "Stop everything" followed by resuming each lever where it was
//! - Saving and restoring the whole dashboard across a remount
//!
//! Run with: cargo run --example car

use rewind::{
    mount, state_graph, unmount, Cleanup, Composite, Config, Guard, MemoryStore, StateStore,
};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

fn wipers_lever() -> Config<Value> {
    Config::builder()
        .id("wipersLever")
        .initial("idle")
        .context(json!({}))
        .states(state_graph! {
            wash => { timer: idle, stop: idle },
            idle => { up: wash, down: speed1 },
            speed1 => { up: idle, down: speed2, stop: idle },
            speed2 => { up: speed1, down: speed3, stop: idle },
            speed3 => { up: speed2, stop: idle },
        })
        .on_change(|state, send| {
            if state.value != "wash" {
                return Cleanup::none();
            }
            let handle = tokio::spawn(async move {
                sleep(Duration::from_secs(1)).await;
                send.send("timer");
            });
            Cleanup::abort(handle)
        })
        .build()
        .expect("wipers config is valid")
}

fn turn_signal_lever() -> Config<Value> {
    Config::builder()
        .id("turnSignalLever")
        .initial("idle")
        .context(json!({}))
        .states(state_graph! {
            blinkLeft => { down: idle, stop: idle },
            idle => { up: blinkLeft, down: blinkRight },
            blinkRight => { up: idle, stop: idle },
        })
        .build()
        .expect("turn signal config is valid")
}

fn transmission() -> Config<Value> {
    Config::builder()
        .id("transmission")
        .initial("park")
        .context(json!({}))
        .states(state_graph! {
            park => { down: reverse },
            reverse => { up: park, down: neutral },
            neutral => { up: reverse, down: drive },
            drive => { up: neutral, down: second },
            second => { up: drive, down: low },
            low => { up: second },
        })
        .build()
        .expect("transmission config is valid")
}

fn pedals() -> Config<Value> {
    Config::builder()
        .id("pedals")
        .initial("idle")
        .context(json!({}))
        .states(state_graph! {
            idle => { gas: gas, brake: brake },
            gas => { stop: idle, gas: idle, brake: brake },
            brake => { stop: idle, gas: gas, brake: idle },
        })
        .build()
        .expect("pedals config is valid")
}

fn car() -> Composite<Value> {
    Composite::from_configs(
        "car",
        [
            ("wipersLever", wipers_lever()),
            ("turnSignalLever", turn_signal_lever()),
            ("transmission", transmission()),
            ("pedals", pedals()),
        ],
    )
    .expect("member names are unique")
}

/// Operate one lever directly.
fn press(car: &Composite<Value>, member: &str, event: &str) {
    if let Some(lever) = car.member(member) {
        lever.send(event);
    }
}

fn dashboard(car: &Composite<Value>) {
    for (name, state) in car.states() {
        println!("  {name:<16} {}", state.value);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Car Dashboard ===\n");

    let memory = MemoryStore::new();
    let store: &dyn StateStore<Value> = &memory;
    let car = car();
    println!("Signature: {}\n", car.signature());
    mount(&car, Some(store));

    press(&car, "transmission", "down");
    press(&car, "pedals", "gas");
    press(&car, "turnSignalLever", "up");
    press(&car, "wipersLever", "down");
    println!("Driving:");
    dashboard(&car);

    println!("\nMaster stop (broadcast):");
    car.send("stop");
    dashboard(&car);

    println!("\nMaster start resumes every lever that was stopped:");
    car.history().undo_when(&Guard::event("stop"));
    dashboard(&car);

    println!("\nWash cycle returns to idle on its own:");
    press(&car, "wipersLever", "up");
    press(&car, "wipersLever", "up");
    dashboard(&car);
    sleep(Duration::from_millis(1200)).await;
    dashboard(&car);

    println!("\nUnmount and mount a fresh dashboard:");
    unmount(&car, Some(store)).await;
    let again = self::car();
    mount(&again, Some(store));
    dashboard(&again);

    again.destroy().await;
    println!("\n=== Demo Complete ===");
}
