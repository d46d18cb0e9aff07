//! # chansync-cli
//!
//! CLI harness for exercising the chansync engine against a scripted
//! mock device.
//!
//! ## Example
//!
//! ```bash
//! # Run the built-in demo against a remote target
//! chansync --target 1234
//!
//! # Replay a scenario file with a tighter retry policy
//! chansync --scenario flaky.json --max-retries 1 --base-delay-ms 250
//! ```

use anyhow::Result;
use chansync_client::{ChannelSyncEngine, RetryPolicy};
use chansync_types::{ChannelSlot, TargetId};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod scenario;

use scenario::Scenario;

/// Synchronize a scripted device's 8 channel slots.
#[derive(Parser, Debug)]
#[command(name = "chansync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Target to synchronize: "local" or a node number
    #[arg(long, default_value = "local")]
    target: TargetId,

    /// JSON scenario describing the scripted device; omit for the
    /// built-in demo
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Retry rounds after the initial dispatch
    #[arg(long, default_value_t = 2)]
    max_retries: u32,

    /// Base backoff delay in milliseconds (retry round N waits N times this)
    #[arg(long, default_value_t = 1000)]
    base_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::demo(),
    };
    tracing::debug!(scripted_slots = scenario.slots.len(), "scenario loaded");
    let transport = scenario.into_transport()?;

    let policy = RetryPolicy {
        max_retries: cli.max_retries,
        base_delay: Duration::from_millis(cli.base_delay_ms),
    };
    let mut engine = ChannelSyncEngine::with_policy(transport, policy);
    engine.on_progress(|message| eprintln!("{message}"));

    let slots = engine.synchronize(&cli.target).await?;
    print_slots(&slots);

    Ok(())
}

fn print_slots(slots: &[ChannelSlot]) {
    println!(
        "{:<5} {:<12} {:<10} {:<7} {:<9} {:<10} {}",
        "slot", "name", "role", "uplink", "downlink", "precision", "psk"
    );
    for slot in slots {
        println!(
            "{:<5} {:<12} {:<10} {:<7} {:<9} {:<10} {}",
            slot.index,
            if slot.name.is_empty() { "-" } else { slot.name.as_str() },
            slot.role.to_string(),
            slot.uplink_enabled,
            slot.downlink_enabled,
            slot.position_precision,
            if slot.psk.is_empty() { "none" } else { "set" },
        );
    }
}
