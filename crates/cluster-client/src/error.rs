//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when mutating cluster state.
///
/// The variants mirror how a level-triggered reconciler has to treat API
/// failures: `AlreadyExists` and `Conflict` are races with another actor and
/// count as success for an idempotent create, `Transient` failures should be
/// requeued with backoff, and `Fatal` failures must surface to the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The object already exists (another actor won the create race)
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic-concurrency conflict
    #[error("conflict: {0}")]
    Conflict(String),

    /// Transient API or transport failure, safe to retry
    #[error("transient error: {0}")]
    Transient(String),

    /// Non-retryable failure (bad request, invariant violation)
    #[error("fatal error: {0}")]
    Fatal(String),
}

impl ClientError {
    /// Classify a `kube::Error` into the reconciler-facing taxonomy.
    ///
    /// API responses are split on status code and reason; everything that is
    /// not an API response (transport, TLS, timeouts) is treated as
    /// transient, since retrying is the only sensible reaction to a
    /// connection-level failure.
    pub fn classify(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) => match resp.code {
                409 if resp.reason == "AlreadyExists" => Self::AlreadyExists(resp.message),
                409 => Self::Conflict(resp.message),
                429 => Self::Transient(resp.message),
                code if code >= 500 => Self::Transient(resp.message),
                _ => Self::Fatal(resp.message),
            },
            other => Self::Transient(other.to_string()),
        }
    }

    /// True when the create race was lost rather than failed.
    pub fn is_benign_create_race(&self) -> bool {
        matches!(self, Self::AlreadyExists(_) | Self::Conflict(_))
    }

    /// True when the operation should be requeued and retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
