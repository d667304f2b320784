//! Cluster access traits for mocking
//!
//! These traits abstract the cluster surface the reconciler needs so that
//! unit tests can run against an in-memory mock instead of a live API
//! server. The lister traits are synchronous: they are backed by local
//! watch caches and never touch the network. Only the mutating client and
//! the event recorder perform I/O.

use crate::error::ClientError;
use crds::Broker;
use k8s_openapi::api::core::v1::Namespace;

/// Read-only cached view of cluster namespaces.
///
/// Backed by a reflector store in production; the view may lag the API
/// server, and callers must tolerate staleness.
pub trait NamespaceLister: Send + Sync {
    /// Look up a namespace by name.
    fn get(&self, name: &str) -> Option<Namespace>;
}

/// Read-only cached view of brokers.
pub trait BrokerLister: Send + Sync {
    /// Look up a broker by namespace and name.
    fn get(&self, namespace: &str, name: &str) -> Option<Broker>;
}

/// Mutating client for broker objects.
///
/// Deliberately create-only: the sugar controller never updates or deletes
/// a broker once it exists, whoever created it.
#[async_trait::async_trait]
pub trait BrokerClient: Send + Sync {
    /// Create a broker in the given namespace.
    async fn create(&self, namespace: &str, broker: &Broker) -> Result<Broker, ClientError>;
}

/// Sink for Kubernetes events attached to namespace objects.
#[async_trait::async_trait]
pub trait EventRecorder: Send + Sync {
    /// Record a `Normal` event against the given namespace.
    async fn record(
        &self,
        namespace: &Namespace,
        reason: &str,
        message: &str,
    ) -> Result<(), ClientError>;
}
