//! Namespace reconciliation.
//!
//! One invocation per delivered key: fetch the namespace from the cached
//! view, evaluate the live selector config against its labels, plan against
//! the observed broker state, and execute at most one create. Every decision
//! is re-derived from fresh reads, so the reconciler is correct under
//! arbitrary replay and out-of-order delivery of watch events.

use crate::config::ConfigStore;
use crate::error::ControllerError;
use crate::planner::{self, Action};
use crate::resources::{self, DEFAULT_BROKER_NAME};
use crate::selector;
use cluster_client::{BrokerClient, BrokerLister, EventRecorder, NamespaceLister};
use k8s_openapi::api::core::v1::Namespace;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Event reason emitted when the default broker is created.
pub const BROKER_CREATED_REASON: &str = "BrokerCreated";

/// Event message emitted when the default broker is created.
pub const BROKER_CREATED_MESSAGE: &str = "Default eventing.knative.dev Broker created.";

/// Reconciles namespaces against the sugar policy.
pub struct Reconciler {
    namespace_lister: Arc<dyn NamespaceLister>,
    broker_lister: Arc<dyn BrokerLister>,
    broker_client: Arc<dyn BrokerClient>,
    recorder: Arc<dyn EventRecorder>,
    config: ConfigStore,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        namespace_lister: Arc<dyn NamespaceLister>,
        broker_lister: Arc<dyn BrokerLister>,
        broker_client: Arc<dyn BrokerClient>,
        recorder: Arc<dyn EventRecorder>,
        config: ConfigStore,
    ) -> Self {
        Self {
            namespace_lister,
            broker_lister,
            broker_client,
            recorder,
            config,
        }
    }

    /// Reconcile a single workqueue key.
    ///
    /// Terminal conditions (bad key, namespace gone, namespace terminating,
    /// nothing to do) return `Ok`; only a failed create surfaces an error,
    /// and [`ControllerError::is_retryable`] tells the queue whether to
    /// requeue it.
    pub async fn reconcile(&self, key: &str) -> Result<(), ControllerError> {
        let Some(name) = namespace_from_key(key) else {
            // A malformed key cannot become valid by retrying
            warn!("Dropping invalid workqueue key {:?}", key);
            return Ok(());
        };

        let Some(namespace) = self.namespace_lister.get(name) else {
            debug!("Namespace {} no longer exists, nothing to do", name);
            return Ok(());
        };

        // Deletion takes absolute precedence over the selector
        if namespace.metadata.deletion_timestamp.is_some() {
            debug!("Namespace {} is terminating, skipping", name);
            return Ok(());
        }

        // Read the selector fresh each invocation; the store is hot-swapped
        // by the config watcher
        let config = self.config.current();
        let labels: BTreeMap<String, String> =
            namespace.metadata.labels.clone().unwrap_or_default();
        let matched = selector::matches(&labels, config.namespace_selector.as_ref());

        let existing = self.broker_lister.get(name, DEFAULT_BROKER_NAME);
        match planner::plan(matched, existing.is_some()) {
            Action::Noop => {
                debug!("Namespace {} requires no action (matched={})", name, matched);
                Ok(())
            }
            Action::Create => self.create_default_broker(&namespace).await,
        }
    }

    async fn create_default_broker(&self, namespace: &Namespace) -> Result<(), ControllerError> {
        let name = namespace.name_any();
        let broker = resources::default_broker(&name);

        match self.broker_client.create(&name, &broker).await {
            Ok(_) => {
                info!("Created default broker in namespace {}", name);
                if let Err(e) = self
                    .recorder
                    .record(namespace, BROKER_CREATED_REASON, BROKER_CREATED_MESSAGE)
                    .await
                {
                    // The broker exists, so a requeue would be a no-op;
                    // the event is best-effort
                    warn!("Failed to record {} event for namespace {}: {}", BROKER_CREATED_REASON, name, e);
                }
                Ok(())
            }
            // The cached broker view was stale; someone else already won
            Err(e) if e.is_benign_create_race() => {
                debug!("Default broker in namespace {} already exists: {}", name, e);
                Ok(())
            }
            Err(e) => {
                error!("Failed to create default broker in namespace {}: {}", name, e);
                Err(ControllerError::Client(e))
            }
        }
    }
}

/// Extract the namespace name from a workqueue key.
///
/// Accepts both the `name` and `namespace/name` shapes the informer layer
/// emits; anything with more segments, or an empty name, is malformed.
fn namespace_from_key(key: &str) -> Option<&str> {
    let parts: Vec<&str> = key.split('/').collect();
    match parts.as_slice() {
        [name] if !name.is_empty() => Some(name),
        [_, name] if !name.is_empty() => Some(name),
        _ => None,
    }
}
