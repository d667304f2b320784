//! Mock cluster for unit testing
//!
//! In-memory implementation of the cluster access traits, so reconciler
//! tests can run without an API server. Stores namespaces and brokers in
//! `Arc<Mutex<HashMap>>` maps, records every create and event, and can be
//! told to fail the next create in a specific way to exercise the error
//! paths.

use crate::error::ClientError;
use crate::traits::{BrokerClient, BrokerLister, EventRecorder, NamespaceLister};
use crds::Broker;
use k8s_openapi::api::core::v1::Namespace;
use kube::ResourceExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Outcome the mock returns for broker create calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateOutcome {
    /// Create succeeds and the broker is stored
    #[default]
    Succeed,
    /// Create fails with `AlreadyExists` (lost race with another actor)
    AlreadyExists,
    /// Create fails with `Conflict`
    Conflict,
    /// Create fails with a retryable server error
    Transient,
}

/// An event captured by the mock recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Name of the namespace the event was attached to
    pub namespace: String,
    /// Event reason code
    pub reason: String,
    /// Human-readable message
    pub message: String,
}

/// Mock cluster for testing
///
/// Implements all four cluster access traits against in-memory state.
#[derive(Clone, Default)]
pub struct MockCluster {
    namespaces: Arc<Mutex<HashMap<String, Namespace>>>,
    brokers: Arc<Mutex<HashMap<(String, String), Broker>>>,
    created: Arc<Mutex<Vec<Broker>>>,
    events: Arc<Mutex<Vec<RecordedEvent>>>,
    create_outcome: Arc<Mutex<CreateOutcome>>,
}

impl MockCluster {
    /// Create an empty mock cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace to the mock store (for test setup).
    pub fn add_namespace(&self, namespace: Namespace) {
        let name = namespace.name_any();
        self.namespaces.lock().unwrap().insert(name, namespace);
    }

    /// Add a broker to the mock store (for test setup).
    pub fn add_broker(&self, broker: Broker) {
        let key = (
            broker.namespace().unwrap_or_default(),
            broker.name_any(),
        );
        self.brokers.lock().unwrap().insert(key, broker);
    }

    /// Configure how the next create calls behave.
    pub fn set_create_outcome(&self, outcome: CreateOutcome) {
        *self.create_outcome.lock().unwrap() = outcome;
    }

    /// Brokers created through the mutating client, in call order.
    pub fn created_brokers(&self) -> Vec<Broker> {
        self.created.lock().unwrap().clone()
    }

    /// Events recorded so far, in call order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Look up a stored broker (for assertions).
    pub fn broker(&self, namespace: &str, name: &str) -> Option<Broker> {
        self.brokers
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }
}

impl NamespaceLister for MockCluster {
    fn get(&self, name: &str) -> Option<Namespace> {
        self.namespaces.lock().unwrap().get(name).cloned()
    }
}

impl BrokerLister for MockCluster {
    fn get(&self, namespace: &str, name: &str) -> Option<Broker> {
        self.brokers
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }
}

#[async_trait::async_trait]
impl BrokerClient for MockCluster {
    async fn create(&self, namespace: &str, broker: &Broker) -> Result<Broker, ClientError> {
        match *self.create_outcome.lock().unwrap() {
            CreateOutcome::AlreadyExists => {
                return Err(ClientError::AlreadyExists(format!(
                    "brokers.eventing.knative.dev \"{}\" already exists",
                    broker.name_any()
                )));
            }
            CreateOutcome::Conflict => {
                return Err(ClientError::Conflict("operation cannot be fulfilled".to_string()));
            }
            CreateOutcome::Transient => {
                return Err(ClientError::Transient("the server is currently unable to handle the request".to_string()));
            }
            CreateOutcome::Succeed => {}
        }

        let key = (namespace.to_string(), broker.name_any());
        let mut brokers = self.brokers.lock().unwrap();
        // The live API is authoritative even when the caller's cached view
        // was stale.
        if brokers.contains_key(&key) {
            return Err(ClientError::AlreadyExists(format!(
                "brokers.eventing.knative.dev \"{}\" already exists",
                broker.name_any()
            )));
        }

        let mut stored = broker.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        brokers.insert(key, stored.clone());
        self.created.lock().unwrap().push(stored.clone());
        Ok(stored)
    }
}

#[async_trait::async_trait]
impl EventRecorder for MockCluster {
    async fn record(
        &self,
        namespace: &Namespace,
        reason: &str,
        message: &str,
    ) -> Result<(), ClientError> {
        self.events.lock().unwrap().push(RecordedEvent {
            namespace: namespace.name_any(),
            reason: reason.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
