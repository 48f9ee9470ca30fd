// src/resolver/distributor.rs
// =============================================================================
// Walks a numeric range, turns every index into a candidate URL, and hands
// each URL to the worker queue in order.
//
// The queue is small (one slot by default), so `send` waits until a worker
// is ready. That wait is what keeps the distributor from racing ahead of
// the workers.
// =============================================================================

use std::ops::Range;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::encode::encode_id;

/// Builds the URL for one index: base prefix + token.
pub fn candidate_url(base_url: &str, index: u64) -> String {
    let token = encode_id(index);
    let mut url = String::with_capacity(base_url.len() + token.len());
    url.push_str(base_url);
    url.push_str(&token);
    url
}

/// Feeds `range` into the queue. Returns how many URLs were handed off.
///
/// Stops early if `cancel` fires or every worker has gone away.
pub(crate) async fn distribute(
    base_url: &str,
    range: Range<u64>,
    queue: &mpsc::Sender<String>,
    cancel: &CancellationToken,
) -> u64 {
    let mut sent = 0;

    for index in range {
        let url = candidate_url(base_url, index);

        let delivered = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            result = queue.send(url) => result.is_ok(),
        };
        if !delivered {
            debug!(index, sent, "distributor stopped early");
            break;
        }
        sent += 1;
    }

    sent
}
