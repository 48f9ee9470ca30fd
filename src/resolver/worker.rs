// src/resolver/worker.rs
// =============================================================================
// A worker takes candidate URLs off the shared queue, sends one HEAD request
// per URL, and turns the response into a ResolvedRecord.
//
// Classification:
// - 302 with a usable Location header -> Redirect { source, target }
// - 404                               -> Absent { source }
// - anything else, or no response     -> Failed { cause }
//
// Each worker builds its own reqwest::Client, so workers never compete for
// the same connection pool. Redirects are NOT followed: we want to see the
// 302 itself, not the page it points to.
//
// Rust concepts:
// - tokio::select!: Wait on several futures, act on whichever finishes first
// - Arc<Mutex<Receiver>>: Many workers taking turns reading one channel
// - Drop: The response is released when it goes out of scope, on every path
// =============================================================================

use std::sync::Arc;

use reqwest::header::{HeaderValue, LOCATION};
use reqwest::{redirect, Client, StatusCode};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use super::config::ResolverConfig;
use super::error::Result;
use super::rate::RateCounter;
use super::record::{FailureCause, ResolvedRecord};

/// The receiving half of the work queue, shared by every worker.
pub(crate) type WorkQueue = Arc<Mutex<mpsc::Receiver<String>>>;

// Builds the HTTP client one worker will own
//
// - redirect::Policy::none(): hand the 302 back to us untouched
// - pool_max_idle_per_host: keep plenty of keep-alive connections around
// - timeout: no request may hang forever on a silent peer
pub(crate) fn build_client(config: &ResolverConfig) -> Result<Client> {
    let client = Client::builder()
        .redirect(redirect::Policy::none())
        .pool_max_idle_per_host(config.max_idle_per_host)
        .connect_timeout(config.request_timeout)
        .timeout(config.request_timeout)
        .build()?;
    Ok(client)
}

pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) client: Client,
    pub(crate) queue: WorkQueue,
    pub(crate) output: mpsc::Sender<ResolvedRecord>,
    pub(crate) counter: Arc<RateCounter>,
    pub(crate) cancel: CancellationToken,
}

impl Worker {
    /// Runs until the queue is closed and empty, the output channel is
    /// closed, or the cancellation token fires.
    pub(crate) async fn run(self) {
        debug!(worker_id = self.id, "worker started");

        loop {
            let url = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = next_url(&self.queue) => match next {
                    Some(url) => url,
                    None => break,
                },
            };

            // Last chance to stop before the request goes out
            if self.cancel.is_cancelled() {
                break;
            }

            self.counter.record_attempt();

            let record = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                record = resolve_one(&self.client, url) => record,
            };

            // Blocks while the consumer is behind; this is our backpressure
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sent = self.output.send(record) => {
                    if sent.is_err() {
                        debug!(worker_id = self.id, "output channel closed");
                        break;
                    }
                }
            }
        }

        debug!(worker_id = self.id, "worker stopped");
    }
}

// Holds the queue lock only while waiting for the next URL
async fn next_url(queue: &WorkQueue) -> Option<String> {
    queue.lock().await.recv().await
}

/// Sends one HEAD request and classifies the outcome.
pub(crate) async fn resolve_one(client: &Client, url: String) -> ResolvedRecord {
    match client.head(&url).send().await {
        Ok(response) => classify(url, response.status(), response.headers().get(LOCATION)),
        Err(error) => {
            trace!(url = %url, error = %error, "request failed");
            ResolvedRecord::Failed {
                cause: FailureCause::transport(&error),
            }
        }
    }
}

fn classify(source: String, status: StatusCode, location: Option<&HeaderValue>) -> ResolvedRecord {
    match status {
        StatusCode::FOUND => match resolve_location(&source, location) {
            Ok(target) => {
                trace!(source = %source, target = %target, "redirect");
                ResolvedRecord::Redirect { source, target }
            }
            Err(cause) => ResolvedRecord::Failed { cause },
        },
        StatusCode::NOT_FOUND => ResolvedRecord::Absent { source },
        other => {
            trace!(source = %source, status = other.as_u16(), "unexpected status");
            ResolvedRecord::Failed {
                cause: FailureCause::UnexpectedStatus {
                    status: other.as_u16(),
                },
            }
        }
    }
}

// Turns a Location header into the redirect target
//
// Absolute locations are reported exactly as the service sent them.
// Relative locations ("/elsewhere") are resolved against the URL we asked for.
fn resolve_location(
    source: &str,
    location: Option<&HeaderValue>,
) -> std::result::Result<String, FailureCause> {
    let value = location.ok_or(FailureCause::MissingLocation)?;

    // Header bytes above 0x7f are legal; accept them as long as they are UTF-8
    let raw = std::str::from_utf8(value.as_bytes()).map_err(|_| {
        FailureCause::MalformedLocation {
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        }
    })?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FailureCause::MissingLocation);
    }

    let malformed = || FailureCause::MalformedLocation {
        value: raw.to_string(),
    };
    match Url::parse(raw) {
        Ok(_) => Ok(raw.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(source).map_err(|_| malformed())?;
            let target = base.join(raw).map_err(|_| malformed())?;
            Ok(target.to_string())
        }
        Err(_) => Err(malformed()),
    }
}
