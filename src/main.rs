use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use hwglance::core::monitor::{MetricsRuntime, PollConfig};
use hwglance::ui;

/// Poll hardware sensors and print snapshots to the terminal.
#[derive(Parser)]
#[command(name = "hwglance", version, about)]
struct Cli {
    /// Seconds between snapshots (clamped to 0.1..=5.0)
    #[arg(short, long, default_value_t = 1.0)]
    interval: f64,

    /// Stop after this many snapshots
    #[arg(short, long)]
    count: Option<u64>,

    /// Emit one JSON document per snapshot instead of formatted text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    hwglance::init_logging();
    let cli = Cli::parse();

    let runtime = MetricsRuntime::new(PollConfig {
        interval_secs: cli.interval,
    })?;
    let mut snapshot_rx = runtime.snapshot_rx.clone();

    let running = Arc::new(AtomicBool::new(true));
    let running_for_handler = Arc::clone(&running);
    ctrlc::set_handler(move || running_for_handler.store(false, Ordering::SeqCst))?;

    let mut printed = 0u64;
    while running.load(Ordering::SeqCst) {
        if snapshot_rx.has_changed()? {
            let snapshot = snapshot_rx.borrow_and_update().clone();
            if cli.json {
                println!("{}", ui::render_json(&snapshot)?);
            } else {
                println!("{}", ui::render_text(&snapshot));
            }
            printed += 1;
            if cli.count.is_some_and(|count| printed >= count) {
                break;
            }
        }
        thread::sleep(Duration::from_millis(50));
    }

    runtime.shutdown();
    Ok(())
}
