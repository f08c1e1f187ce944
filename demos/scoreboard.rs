//! Scoreboard replication demo
//!
//! Run with: cargo run --example scoreboard
//!
//! Starts an in-process runtime, registers a server registry with a
//! couple of access methods, connects two clients, and drives one round
//! of blocking calls, broadcast events, and value replication.
//!
//! Log output is controlled through RUST_LOG, e.g.:
//!   RUST_LOG=remotes_rs=trace cargo run --example scoreboard

use std::collections::HashMap;

use remotes_rs::{
    AccessTable, ClientModule, ClientRegistry, Error, NetRuntime, ServerRegistry, Value,
};

/// Server-side state: points per peer
#[derive(Default)]
struct Scoreboard {
    scores: HashMap<String, f64>,
}

/// Client-side module mirroring replicated values
#[derive(Default)]
struct Hud {
    values: HashMap<String, Value>,
}

impl ClientModule for Hud {
    fn set_value(&mut self, key: &str, value: Value) {
        println!("hud update: {} = {:?}", key, value);
        self.values.insert(key.to_string(), value);
    }

    fn dispatch(&mut self, method: &str, args: &[Value]) -> remotes_rs::Result<()> {
        match method {
            "announce" => {
                println!("announcement: {:?}", args);
                Ok(())
            }
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("remotes_rs=debug".parse()?),
        )
        .init();

    let runtime = NetRuntime::new();

    let access = AccessTable::new()
        .with("submit", |board: &mut Scoreboard, caller, args: &[Value]| {
            let points = args.first().and_then(Value::as_number).unwrap_or(0.0);
            let total = board.scores.entry(caller.to_string()).or_insert(0.0);
            *total += points;
            Some(Value::from(*total))
        })?
        .with("total", |board: &mut Scoreboard, caller, _args: &[Value]| {
            board
                .scores
                .get(&caller.to_string())
                .copied()
                .map(Value::from)
        })?;

    let server = ServerRegistry::with_access(
        &runtime.server(),
        "scoreboard",
        Scoreboard::default(),
        access,
    )?;

    let alice = ClientRegistry::new(&runtime.connect(), "scoreboard", Hud::default()).await?;
    let bob = ClientRegistry::new(&runtime.connect(), "scoreboard", Hud::default()).await?;

    let mut leader = alice.server_changed_signal("leader")?;

    // Each client submits points over the blocking call path
    let alice_total = alice.fetch("submit", vec![Value::from(30.0)]).await?;
    let bob_total = bob.fetch("submit", vec![Value::from(50.0)]).await?;
    println!("alice total: {:?}", alice_total);
    println!("bob total:   {:?}", bob_total);

    // Server replicates the leader to everyone and announces the round
    server.set_all("leader", Value::from(bob.peer().to_string()))?;
    server.fire_all("announce", vec![Value::from("round over")])?;

    let observed = leader.recv().await?;
    println!("leader now: {:?}", observed);

    server.destroy()?;
    Ok(())
}
