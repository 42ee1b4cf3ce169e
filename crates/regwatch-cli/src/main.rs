mod config;
mod display;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use regwatch_core::fallback;
use regwatch_dashboard::{DashboardController, RefreshOutcome};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!("regwatch v{}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Command::Show { json: false }) {
        Command::Show { json } => {
            let controller = cli.provider.build_controller()?;
            if !json {
                eprintln!("Scanning regulatory portals...");
            }
            let outcome = controller.refresh().await;
            print_snapshot(&controller, json).await?;
            if let RefreshOutcome::Failed(message) = outcome {
                anyhow::bail!("refresh failed: {message}");
            }
        }
        Command::Watch { interval, json } => {
            let controller = cli.provider.build_controller()?;
            run_watch(&controller, Duration::from_secs(interval.max(1)), json).await?;
        }
        Command::Fallback { json } => {
            if json {
                let dataset = serde_json::json!({
                    "version": fallback::FALLBACK_VERSION,
                    "updates": fallback::updates(),
                    "analysis": fallback::analysis(),
                });
                println!("{}", serde_json::to_string_pretty(&dataset)?);
            } else {
                print!("{}", display::render_fallback()?);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn print_snapshot(controller: &DashboardController, json: bool) -> anyhow::Result<()> {
    let snapshot = controller.snapshot().await;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("serialising dashboard snapshot")?
        );
    } else {
        print!(
            "{}",
            display::render_dashboard(&snapshot).context("rendering dashboard")?
        );
    }
    Ok(())
}

/// Refresh on every tick until Ctrl-C. Failures are rendered and the loop
/// keeps going; the next tick is the retry.
async fn run_watch(
    controller: &DashboardController,
    interval: Duration,
    json: bool,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(interval_secs = interval.as_secs(), "watching for regulatory updates");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = controller.refresh().await;
                if outcome != RefreshOutcome::AlreadyLoading {
                    print_snapshot(controller, json).await?;
                }
            }
            res = &mut shutdown => {
                res.context("listening for Ctrl-C")?;
                info!("stopping watch");
                return Ok(());
            }
        }
    }
}
