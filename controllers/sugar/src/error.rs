//! Controller-specific error types.
//!
//! This module defines error types specific to the Sugar Controller
//! that are not covered by upstream library errors.

use cluster_client::ClientError;
use thiserror::Error;

/// Errors that can occur in the Sugar Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Cluster client error from the create path
    #[error("Cluster client error: {0}")]
    Client(#[from] ClientError),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ControllerError {
    /// True when the failed reconciliation should be requeued with backoff.
    ///
    /// Only transient create failures qualify; everything else is either
    /// terminal (handled before an error is raised) or fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Client(e) if e.is_retryable())
    }
}
