// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (RUST_LOG controls the level, default "info")
// 2. Parse command-line arguments using clap
// 3. Start the resolver on its own task
// 4. Drain its results, logging the request rate on a timer
// 5. Print a summary and exit (0 = finished, 2 = error)
//
// Ctrl-C asks the resolver to stop; whatever is in flight still gets counted.
// =============================================================================

mod cli;
mod report;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use shortlink_scan::resolver::{Resolver, ResolverConfig};

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "scan failed");
            eprintln!("Error: {e:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so `--json` output on stdout stays clean
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.output_capacity == 0 {
        bail!("--output-capacity must be at least 1");
    }
    if cli.report_interval_secs == 0 {
        bail!("--report-interval-secs must be at least 1");
    }

    let resolver = Arc::new(
        Resolver::new(ResolverConfig::from(&cli)).context("invalid resolver settings")?,
    );

    let (tx, rx) = mpsc::channel(cli.output_capacity);

    let scan = {
        let resolver = Arc::clone(&resolver);
        let (start, end) = (cli.start, cli.end);
        tokio::spawn(async move { resolver.resolve_range(start, end, tx).await })
    };

    let reporter = report::spawn_rate_reporter(
        Arc::clone(&resolver),
        Duration::from_secs(cli.report_interval_secs),
    );

    {
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("interrupt received, stopping scan");
                    resolver.shutdown();
                }
                Err(e) => warn!(error = %e, "could not listen for ctrl-c"),
            }
        });
    }

    info!(start = cli.start, end = cli.end, json = cli.json, "draining results");
    let tally = report::drain(rx, cli.json).await?;
    reporter.abort();

    let dispatched = scan.await.context("scan task panicked")??;
    report::print_summary(&tally, dispatched, resolver.rate_snapshot());

    Ok(())
}
