// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every flag has a default, so running `shortlink-scan` with no arguments
// scans the whole four-character git.io space with 100 workers.
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Derive macros: Automatically generate code for our types
// - From/Into: Converting the parsed flags into the resolver's config
// =============================================================================

use clap::Parser;
use std::time::Duration;

use shortlink_scan::resolver::ResolverConfig;

// 62^4: every token of up to four characters
const FOUR_CHAR_SPACE: u64 = 62 * 62 * 62 * 62;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
#[derive(Parser, Debug)]
#[command(
    name = "shortlink-scan",
    version,
    about = "Enumerate short-link tokens and find out where they redirect",
    long_about = "shortlink-scan walks a range of base-62 tokens, sends a HEAD request for each \
                  one to a short-link service, and reports which tokens redirect, which are \
                  unclaimed, and which failed."
)]
pub struct Cli {
    /// URL prefix each token is appended to
    #[arg(long, default_value = "https://git.io/")]
    pub base_url: String,

    /// First index to try (inclusive)
    #[arg(long, default_value_t = 0)]
    pub start: u64,

    /// Index to stop at (exclusive)
    #[arg(long, default_value_t = FOUR_CHAR_SPACE)]
    pub end: u64,

    /// Number of concurrent workers
    #[arg(long, default_value_t = 100)]
    pub workers: usize,

    /// URLs that may wait for a free worker
    #[arg(long, default_value_t = 1)]
    pub queue_capacity: usize,

    /// Results that may wait for the consumer
    #[arg(long, default_value_t = 1024)]
    pub output_capacity: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Idle keep-alive connections per worker per host
    #[arg(long, default_value_t = 1024)]
    pub max_idle_per_host: usize,

    /// Seconds between request-rate reports
    #[arg(long, default_value_t = 10)]
    pub report_interval_secs: u64,

    /// Print every result as a JSON line instead of discarding it
    #[arg(long)]
    pub json: bool,
}

impl From<&Cli> for ResolverConfig {
    fn from(cli: &Cli) -> Self {
        ResolverConfig {
            base_url: cli.base_url.clone(),
            worker_count: cli.workers,
            queue_capacity: cli.queue_capacity,
            max_idle_per_host: cli.max_idle_per_host,
            request_timeout: Duration::from_secs(cli.timeout_secs),
        }
    }
}
