// src/report.rs
// =============================================================================
// The consumer side of the scan:
// - drain: reads every record off the output channel and counts it
// - spawn_rate_reporter: logs the request rate on a fixed cadence
// - print_summary: the closing numbers once the scan is over
//
// The drain loop must keep up with the workers. If it stops reading, the
// workers block on send and the whole scan stalls.
// =============================================================================

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use shortlink_scan::resolver::{RateSnapshot, ResolvedRecord, Resolver};

// Running counts of each kind of record
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub redirects: u64,
    pub absent: u64,
    pub failed: u64,
}

impl Tally {
    pub fn record(&mut self, record: &ResolvedRecord) {
        match record {
            ResolvedRecord::Redirect { .. } => self.redirects += 1,
            ResolvedRecord::Absent { .. } => self.absent += 1,
            ResolvedRecord::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.redirects + self.absent + self.failed
    }
}

// Reads records until every worker has dropped its sender
//
// With `json` set, each record is written to stdout as one line.
// Otherwise records are only counted.
pub async fn drain(mut records: mpsc::Receiver<ResolvedRecord>, json: bool) -> Result<Tally> {
    let mut tally = Tally::default();
    let stdout = std::io::stdout();

    while let Some(record) = records.recv().await {
        tally.record(&record);

        if json {
            let mut out = stdout.lock();
            serde_json::to_writer(&mut out, &record)?;
            writeln!(out)?;
        }
    }

    Ok(tally)
}

// Logs requests-per-second every `every` until aborted
pub fn spawn_rate_reporter(resolver: Arc<Resolver>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick fires immediately, skip it
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let snapshot = resolver.rate_snapshot();
            info!(
                rps = %format!("{:.2}", snapshot.per_second),
                attempts = snapshot.attempts,
                "request rate"
            );
        }
    })
}

pub fn print_summary(tally: &Tally, dispatched: u64, rate: RateSnapshot) {
    eprintln!();
    eprintln!("📊 Summary:");
    eprintln!("   🔀 Redirects: {}", tally.redirects);
    eprintln!("   ❌ Absent: {}", tally.absent);
    eprintln!("   ⚠️  Failed: {}", tally.failed);
    eprintln!("   📋 Total: {} of {} dispatched", tally.total(), dispatched);
    eprintln!(
        "   ⏱️  {} requests in {:.1}s ({:.2} req/s)",
        rate.attempts,
        rate.elapsed.as_secs_f64(),
        rate.per_second
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortlink_scan::resolver::FailureCause;

    #[tokio::test]
    async fn test_drain_counts_each_kind() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(ResolvedRecord::Redirect {
            source: "https://git.io/a".to_string(),
            target: "https://example.com/".to_string(),
        })
        .await
        .unwrap();
        tx.send(ResolvedRecord::Absent {
            source: "https://git.io/b".to_string(),
        })
        .await
        .unwrap();
        tx.send(ResolvedRecord::Failed {
            cause: FailureCause::MissingLocation,
        })
        .await
        .unwrap();
        tx.send(ResolvedRecord::Failed {
            cause: FailureCause::UnexpectedStatus { status: 503 },
        })
        .await
        .unwrap();
        drop(tx);

        let tally = drain(rx, false).await.unwrap();
        assert_eq!(
            tally,
            Tally {
                redirects: 1,
                absent: 1,
                failed: 2,
            }
        );
        assert_eq!(tally.total(), 4);
    }
}
