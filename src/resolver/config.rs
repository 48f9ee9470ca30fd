// src/resolver/config.rs
// =============================================================================
// Settings the resolver is built with.
//
// All of these are fixed once the resolver starts. The CLI fills them in from
// flags (see src/cli.rs); tests usually start from Default and override a few.
// =============================================================================

use std::time::Duration;

use super::error::{ResolverError, Result};

pub const DEFAULT_BASE_URL: &str = "https://git.io/";
pub const DEFAULT_WORKER_COUNT: usize = 100;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1;
pub const DEFAULT_MAX_IDLE_PER_HOST: usize = 1024;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Prefix every token is appended to, e.g. "https://git.io/"
    pub base_url: String,
    /// Number of workers, each with its own HTTP client
    pub worker_count: usize,
    /// How many URLs may wait in the work queue before the distributor blocks
    pub queue_capacity: usize,
    /// Idle keep-alive connections each client may hold per host
    pub max_idle_per_host: usize,
    /// Deadline for one HEAD request, connect included
    pub request_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ResolverConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(ResolverError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ResolverError::InvalidConfig(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ResolverError::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            ResolverError::InvalidConfig(format!("base URL '{}': {}", self.base_url, e))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ResolverError::InvalidConfig(format!(
                "base URL '{}' must be http or https",
                self.base_url
            )));
        }
        // Tokens are appended as-is, so "https://git.io" would give "https://git.io0"
        if !self.base_url.ends_with('/') && parsed.query().is_none() {
            return Err(ResolverError::InvalidConfig(format!(
                "base URL '{}' must end with '/' or an open query such as '?id='",
                self.base_url
            )));
        }

        Ok(())
    }
}
