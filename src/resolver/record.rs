// src/resolver/record.rs
// =============================================================================
// The result types that workers send to the output channel.
//
// Every candidate URL ends up as exactly one ResolvedRecord:
// - Redirect: the service answered 302 and told us where it goes
// - Absent:   the service answered 404, nobody claimed this token
// - Failed:   anything else, with the cause attached
//
// #[serde(tag = "kind")] makes the JSON output self-describing, e.g.
//   {"kind":"redirect","source":"https://git.io/1a","target":"https://..."}
// =============================================================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedRecord {
    /// The candidate redirects to `target`
    Redirect { source: String, target: String },
    /// The candidate is not claimed
    Absent { source: String },
    /// The attempt did not produce a usable answer
    Failed { cause: FailureCause },
}

/// Why an attempt was classified as [`ResolvedRecord::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureCause {
    /// Connection, DNS, TLS or timeout failure before a response arrived
    Transport { message: String, timed_out: bool },
    /// 302 without a Location header
    MissingLocation,
    /// 302 whose Location header is not text or not a valid URL
    MalformedLocation { value: String },
    /// Any status other than 302 or 404
    UnexpectedStatus { status: u16 },
}

impl ResolvedRecord {
    pub fn is_redirect(&self) -> bool {
        matches!(self, ResolvedRecord::Redirect { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResolvedRecord::Failed { .. })
    }

    /// The candidate URL this record is about, when the record keeps it.
    pub fn source(&self) -> Option<&str> {
        match self {
            ResolvedRecord::Redirect { source, .. } | ResolvedRecord::Absent { source } => {
                Some(source)
            }
            ResolvedRecord::Failed { .. } => None,
        }
    }
}

impl FailureCause {
    pub(crate) fn transport(error: &reqwest::Error) -> Self {
        FailureCause::Transport {
            message: error.to_string(),
            timed_out: error.is_timeout(),
        }
    }
}
