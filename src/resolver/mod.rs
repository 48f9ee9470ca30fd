// src/resolver/mod.rs
// =============================================================================
// The resolver ties the pieces together:
//
//   distributor --(work queue)--> workers --(output channel)--> consumer
//
// Submodules:
// - encode:      index <-> base-62 token
// - rate:        shared attempt counter and req/s
// - record:      the ResolvedRecord results
// - worker:      HEAD request + response classification
// - distributor: range -> URLs -> work queue
// - config:      construction-time settings
// - error:       ResolverError
// =============================================================================

mod config;
mod distributor;
mod encode;
mod error;
mod rate;
mod record;
mod worker;

pub use config::ResolverConfig;
pub use distributor::candidate_url;
pub use encode::{decode_id, encode_id};
pub use error::{ResolverError, Result};
pub use rate::{RateCounter, RateSnapshot};
pub use record::{FailureCause, ResolvedRecord};

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use worker::{build_client, Worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    NotStarted,
    Running,
    Stopped,
}

impl ResolverState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ResolverState::NotStarted,
            1 => ResolverState::Running,
            _ => ResolverState::Stopped,
        }
    }
}

/// Enumerates a range of short-link tokens and resolves each one.
///
/// A resolver runs one scan. Share it behind an `Arc` to read the rate or
/// call [`Resolver::shutdown`] while [`Resolver::resolve_range`] is running.
pub struct Resolver {
    config: ResolverConfig,
    counter: Arc<RateCounter>,
    cancel: CancellationToken,
    state: AtomicU8,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            counter: Arc::new(RateCounter::new()),
            cancel: CancellationToken::new(),
            state: AtomicU8::new(ResolverState::NotStarted as u8),
        })
    }

    pub fn state(&self) -> ResolverState {
        ResolverState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Requests per second since the resolver was created.
    pub fn current_rate(&self) -> f64 {
        self.counter.current_rate()
    }

    pub fn rate_snapshot(&self) -> RateSnapshot {
        self.counter.snapshot()
    }

    /// Stops the distributor and every worker at their next suspension point.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("resolver shutdown requested");
            self.cancel.cancel();
        }
    }

    /// Resolves every index in `start..end`, sending one record per attempt
    /// to `output`.
    ///
    /// Starts the worker pool, feeds it the range, then waits for the pool to
    /// finish what was queued. Returns the number of URLs handed to the pool.
    /// The output channel closes once the last worker is done.
    ///
    /// # Errors
    ///
    /// - `InvalidRange` if `start > end`
    /// - `AlreadyStarted` if called more than once
    /// - `ClientBuild` if a worker's HTTP client can't be created
    pub async fn resolve_range(
        &self,
        start: u64,
        end: u64,
        output: mpsc::Sender<ResolvedRecord>,
    ) -> Result<u64> {
        if start > end {
            return Err(ResolverError::InvalidRange { start, end });
        }

        self.state
            .compare_exchange(
                ResolverState::NotStarted as u8,
                ResolverState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| ResolverError::AlreadyStarted)?;

        let clients = match (0..self.config.worker_count)
            .map(|_| build_client(&self.config))
            .collect::<Result<Vec<_>>>()
        {
            Ok(clients) => clients,
            Err(e) => {
                self.state.store(ResolverState::Stopped as u8, Ordering::Release);
                return Err(e);
            }
        };

        let (queue_tx, queue_rx) = mpsc::channel::<String>(self.config.queue_capacity);
        let queue = Arc::new(Mutex::new(queue_rx));

        info!(
            worker_count = self.config.worker_count,
            start,
            end,
            base_url = %self.config.base_url,
            "starting scan"
        );

        let handles: Vec<_> = clients
            .into_iter()
            .enumerate()
            .map(|(id, client)| {
                let worker = Worker {
                    id,
                    client,
                    queue: Arc::clone(&queue),
                    output: output.clone(),
                    counter: Arc::clone(&self.counter),
                    cancel: self.cancel.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        // Only the workers hold senders now, so the channel closes with them
        drop(output);

        let dispatched =
            distributor::distribute(&self.config.base_url, start..end, &queue_tx, &self.cancel)
                .await;
        drop(queue_tx);

        for (worker_id, joined) in join_all(handles).await.into_iter().enumerate() {
            if let Err(join_error) = joined {
                error!(worker_id, error = %join_error, "worker task panicked");
            }
        }

        self.state.store(ResolverState::Stopped as u8, Ordering::Release);

        let snapshot = self.counter.snapshot();
        info!(
            dispatched,
            attempts = snapshot.attempts,
            rps = snapshot.per_second,
            cancelled = self.cancel.is_cancelled(),
            "scan finished"
        );

        Ok(dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, worker_count: usize) -> ResolverConfig {
        ResolverConfig {
            worker_count,
            request_timeout: Duration::from_secs(5),
            ..ResolverConfig::with_base_url(format!("{}/", server.uri()))
        }
    }

    // Index i answers 302 when i % 3 == 0, 404 when 1, 500 when 2
    async fn mount_alternating(server: &MockServer, range: std::ops::Range<u64>) {
        for index in range {
            let response = match index % 3 {
                0 => ResponseTemplate::new(302)
                    .insert_header("Location", format!("https://example.com/{index}")),
                1 => ResponseTemplate::new(404),
                _ => ResponseTemplate::new(500),
            };
            Mock::given(method("HEAD"))
                .and(path(format!("/{}", encode_id(index))))
                .respond_with(response)
                .mount(server)
                .await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_resolves_whole_range() {
        let server = MockServer::start().await;
        mount_alternating(&server, 0..200).await;

        let resolver = Arc::new(Resolver::new(config_for(&server, 16)).unwrap());
        let (tx, mut rx) = mpsc::channel(1024);

        let scan = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.resolve_range(0, 200, tx).await })
        };

        let mut records = Vec::new();
        while let Some(record) = rx.recv().await {
            records.push(record);
        }

        assert_eq!(scan.await.unwrap().unwrap(), 200);
        assert_eq!(records.len(), 200);
        assert_eq!(resolver.rate_snapshot().attempts, 200);
        assert_eq!(resolver.state(), ResolverState::Stopped);

        let redirects: Vec<_> = records.iter().filter(|r| r.is_redirect()).collect();
        let absent = records
            .iter()
            .filter(|r| matches!(r, ResolvedRecord::Absent { .. }))
            .count();
        let failed = records.iter().filter(|r| r.is_failed()).count();
        assert_eq!(redirects.len(), 67);
        assert_eq!(absent, 67);
        assert_eq!(failed, 66);

        // Each redirect points where the mock said, for the token it came from
        for record in redirects {
            if let ResolvedRecord::Redirect { source, target } = record {
                let token = source.rsplit('/').next().unwrap();
                let index = decode_id(token).unwrap();
                assert_eq!(index % 3, 0);
                assert_eq!(target, &format!("https://example.com/{index}"));
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stalled_consumer_plateaus() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let workers = 4;
        let output_capacity = 8;
        let config = config_for(&server, workers);
        let bound = (workers + config.queue_capacity + output_capacity) as u64;

        let resolver = Arc::new(Resolver::new(config).unwrap());
        // Keep the receiver alive but never read from it
        let (tx, _rx) = mpsc::channel(output_capacity);

        let scan = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.resolve_range(0, 10_000, tx).await })
        };

        tokio::time::sleep(Duration::from_millis(500)).await;
        let first = resolver.rate_snapshot().attempts;
        tokio::time::sleep(Duration::from_millis(300)).await;
        let second = resolver.rate_snapshot().attempts;

        assert_eq!(first, second, "attempts kept growing with no consumer");
        assert!(second > 0);
        assert!(second <= bound, "{second} attempts exceeds bound {bound}");

        resolver.shutdown();
        let dispatched = tokio::time::timeout(Duration::from_secs(5), scan)
            .await
            .expect("scan did not stop after shutdown")
            .unwrap()
            .unwrap();
        assert!(dispatched < 10_000);
    }

    #[tokio::test]
    async fn test_shutdown_stops_long_scan() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let resolver = Arc::new(Resolver::new(config_for(&server, 4)).unwrap());
        let (tx, mut rx) = mpsc::channel(64);
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        let scan = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.resolve_range(0, u64::MAX, tx).await })
        };

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(resolver.state(), ResolverState::Running);
        resolver.shutdown();

        tokio::time::timeout(Duration::from_secs(5), scan)
            .await
            .expect("scan did not stop after shutdown")
            .unwrap()
            .unwrap();
        drain.await.unwrap();
        assert_eq!(resolver.state(), ResolverState::Stopped);
        assert!(resolver.current_rate() > 0.0);
    }

    #[tokio::test]
    async fn test_second_scan_is_rejected() {
        let resolver = Resolver::new(ResolverConfig {
            worker_count: 1,
            ..Default::default()
        })
        .unwrap();

        let (tx, _rx) = mpsc::channel(1);
        assert_eq!(resolver.resolve_range(5, 5, tx).await.unwrap(), 0);

        let (tx, _rx) = mpsc::channel(1);
        assert!(matches!(
            resolver.resolve_range(0, 1, tx).await,
            Err(ResolverError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let resolver = Resolver::new(ResolverConfig::default()).unwrap();
        let (tx, _rx) = mpsc::channel(1);

        assert!(matches!(
            resolver.resolve_range(10, 2, tx).await,
            Err(ResolverError::InvalidRange { start: 10, end: 2 })
        ));
        assert_eq!(resolver.state(), ResolverState::NotStarted);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = Resolver::new(ResolverConfig {
            worker_count: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(ResolverError::InvalidConfig(_))));
    }
}
