// src/resolver/error.rs
// =============================================================================
// Errors that stop the resolver itself (bad settings, misuse).
//
// Per-URL problems are NOT errors here: they become ResolvedRecord::Failed
// and flow down the output channel like any other result.
// =============================================================================

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolverError>;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("resolver has already been started")]
    AlreadyStarted,
}
