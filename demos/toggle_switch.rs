//! Toggle Switch
//!
//! This demo shows the smallest useful machine: two states and one event.
//!
//! Key concepts:
//! - Declaring a graph with `state_graph!`
//! - Unknown events are silent no-ops
//! - Undo/redo over the history chain
//! - Listeners fired after each transition
//!
//! Run with: cargo run --example toggle_switch

use rewind::{state_graph, Cleanup, Config, Machine};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Toggle Switch ===\n");

    let config = Config::builder()
        .id("toggleSwitch")
        .initial("off")
        .context(())
        .states(state_graph! {
            on => { toggle: off },
            off => { toggle: on },
        })
        .on_change(|state, _send| {
            println!("  [onChange] light is {}", state.value);
            Cleanup::none()
        })
        .build()
        .expect("toggle switch config is valid");

    println!("Signature: {}\n", config.signature());
    let switch = Machine::create(config);

    switch.send("toggle");
    switch.send("toggle");
    switch.send("toggle");
    tokio::time::sleep(Duration::from_millis(20)).await;

    println!("\nSending an event the graph does not define:");
    let accepted = switch.send("spin");
    println!("  spin accepted: {accepted}, still {}", switch.value());

    println!("\nUndo twice, then redo once:");
    switch.history().undo();
    switch.history().undo();
    switch.history().redo();
    tokio::time::sleep(Duration::from_millis(20)).await;

    println!("\nPath: {:?}", switch.path());

    switch.destroy().await;
    println!("\n=== Demo Complete ===");
}
