//! Countdown Timer
//!
//! This demo drives a countdown from a listener that schedules a tick one
//! second after each change.
//!
//! Key concepts:
//! - Listener side effects returning a cleanup (the timer is aborted)
//! - Context patches computed from the current context
//! - Stop, then resume where the timer was stopped via guarded undo
//! - Checkpoint JSON for a paused timer
//!
//! Run with: cargo run --example timer

use rewind::{state_graph, Cleanup, Config, ContextPatch, Guard, Machine};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

fn timer_config(seconds: u64) -> Config<Value> {
    Config::builder()
        .id("timer")
        .initial("idle")
        .context(json!({ "seconds": seconds }))
        .states(state_graph! {
            idle => { edit: idle, start: countdown },
            countdown => { tick: countdown, finish: ringing, stop: idle },
            ringing => { stop: idle },
        })
        .on_change(|state, send| {
            println!("  [{}] seconds = {}", state.value, state.context["seconds"]);
            if state.value != "countdown" {
                return Cleanup::none();
            }
            let event = if state.context["seconds"].as_u64().unwrap_or(0) > 0 {
                "tick"
            } else {
                "finish"
            };
            let handle = tokio::spawn(async move {
                sleep(Duration::from_secs(1)).await;
                send.send_with(
                    event,
                    ContextPatch::with(|ctx: &Value| {
                        let seconds = ctx["seconds"].as_u64().unwrap_or(0);
                        json!({ "seconds": seconds.saturating_sub(1) })
                    }),
                );
            });
            Cleanup::abort(handle)
        })
        .build()
        .expect("timer config is valid")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Countdown Timer ===\n");

    let timer = Machine::create(timer_config(0));
    timer.send_with("edit", ContextPatch::value(json!({ "seconds": 3 })));
    timer.send("start");
    sleep(Duration::from_millis(1500)).await;

    println!("\nStopping the timer:");
    timer.send("stop");
    sleep(Duration::from_millis(100)).await;

    let checkpoint = timer.checkpoint();
    match checkpoint.to_json() {
        Ok(json) => println!("  checkpoint is {} bytes of JSON", json.len()),
        Err(error) => println!("  checkpoint failed: {error}"),
    }

    println!("\nResuming where it was stopped:");
    timer.history().undo_when(&Guard::event("stop"));
    sleep(Duration::from_millis(3500)).await;

    println!("\nPath: {:?}", timer.path());
    timer.destroy().await;
    println!("\n=== Demo Complete ===");
}
