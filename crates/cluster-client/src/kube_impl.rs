//! Kube-backed implementations of the cluster access traits
//!
//! Listers wrap `kube_runtime` reflector stores (populated elsewhere by the
//! controller's watch tasks); the broker client and event recorder wrap the
//! regular API machinery.

use crate::error::ClientError;
use crate::traits::{BrokerClient, BrokerLister, EventRecorder, NamespaceLister};
use crds::Broker;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::PostParams;
use kube::{Api, Client, Resource};
use kube_runtime::events::{Event, EventType, Recorder, Reporter};
use kube_runtime::reflector::{ObjectRef, Store};
use tracing::debug;

/// Namespace lister backed by a reflector store.
#[derive(Clone)]
pub struct StoreNamespaceLister {
    store: Store<Namespace>,
}

impl StoreNamespaceLister {
    /// Wrap a reflector store.
    pub fn new(store: Store<Namespace>) -> Self {
        Self { store }
    }
}

impl NamespaceLister for StoreNamespaceLister {
    fn get(&self, name: &str) -> Option<Namespace> {
        self.store.get(&ObjectRef::new(name)).map(|ns| (*ns).clone())
    }
}

/// Broker lister backed by a reflector store.
#[derive(Clone)]
pub struct StoreBrokerLister {
    store: Store<Broker>,
}

impl StoreBrokerLister {
    /// Wrap a reflector store.
    pub fn new(store: Store<Broker>) -> Self {
        Self { store }
    }
}

impl BrokerLister for StoreBrokerLister {
    fn get(&self, namespace: &str, name: &str) -> Option<Broker> {
        self.store
            .get(&ObjectRef::new(name).within(namespace))
            .map(|b| (*b).clone())
    }
}

/// Broker client backed by the API server.
#[derive(Clone)]
pub struct KubeBrokerClient {
    client: Client,
}

impl KubeBrokerClient {
    /// Create a broker client from a Kubernetes client handle.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl BrokerClient for KubeBrokerClient {
    async fn create(&self, namespace: &str, broker: &Broker) -> Result<Broker, ClientError> {
        let api: Api<Broker> = Api::namespaced(self.client.clone(), namespace);
        debug!("Creating broker in namespace {}", namespace);
        api.create(&PostParams::default(), broker)
            .await
            .map_err(ClientError::classify)
    }
}

/// Event recorder backed by the Kubernetes events API.
pub struct KubeEventRecorder {
    recorder: Recorder,
}

impl KubeEventRecorder {
    /// Create a recorder reporting as the given controller name.
    pub fn new(client: Client, controller: &str) -> Self {
        let reporter = Reporter {
            controller: controller.to_string(),
            instance: None,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait::async_trait]
impl EventRecorder for KubeEventRecorder {
    async fn record(
        &self,
        namespace: &Namespace,
        reason: &str,
        message: &str,
    ) -> Result<(), ClientError> {
        let reference = namespace.object_ref(&());
        self.recorder
            .publish(
                &Event {
                    type_: EventType::Normal,
                    reason: reason.to_string(),
                    note: Some(message.to_string()),
                    action: "Create".to_string(),
                    secondary: None,
                },
                &reference,
            )
            .await
            .map_err(ClientError::classify)
    }
}
