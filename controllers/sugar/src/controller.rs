//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the watch
//! streams, cached stores, config store, work queue, and reconcile workers
//! together, and runs them until one of the watch tasks exits.

use crate::config::ConfigStore;
use crate::error::ControllerError;
use crate::queue::WorkQueue;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use cluster_client::{
    KubeBrokerClient, KubeEventRecorder, StoreBrokerLister, StoreNamespaceLister,
};
use crds::Broker;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace};
use kube::{Api, Client};
use kube_runtime::reflector;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Name this controller reports as in emitted events.
const CONTROLLER_NAME: &str = "sugar-controller";

/// Requeue backoff bounds in seconds.
const MIN_BACKOFF_SECS: u64 = 1;
const MAX_BACKOFF_SECS: u64 = 300;

/// Main controller for namespace sugar management.
pub struct Controller {
    namespace_watcher: JoinHandle<Result<(), ControllerError>>,
    broker_watcher: JoinHandle<Result<(), ControllerError>>,
    config_watcher: JoinHandle<Result<(), ControllerError>>,
    queue: WorkQueue,
    workers: Vec<JoinHandle<()>>,
}

impl Controller {
    /// Creates a new controller instance.
    ///
    /// `system_namespace` is where the `config-sugar` ConfigMap lives;
    /// `worker_count` reconcile workers drain the queue concurrently.
    pub async fn new(
        system_namespace: String,
        worker_count: usize,
    ) -> Result<Self, ControllerError> {
        info!("Initializing sugar controller");

        // Create Kubernetes client
        let client = Client::try_default().await.map_err(ControllerError::Kube)?;

        // API handles: namespaces and brokers cluster-wide, config in the
        // system namespace only
        let namespace_api: Api<Namespace> = Api::all(client.clone());
        let broker_api: Api<Broker> = Api::all(client.clone());
        let configmap_api: Api<ConfigMap> = Api::namespaced(client.clone(), &system_namespace);

        // Cached views the reconciler reads
        let (namespace_store, namespace_writer) = reflector::store::<Namespace>();
        let (broker_store, broker_writer) = reflector::store::<Broker>();

        let config_store = ConfigStore::default();
        let queue = WorkQueue::new(MIN_BACKOFF_SECS, MAX_BACKOFF_SECS);

        let reconciler = Arc::new(Reconciler::new(
            Arc::new(StoreNamespaceLister::new(namespace_store.clone())),
            Arc::new(StoreBrokerLister::new(broker_store.clone())),
            Arc::new(KubeBrokerClient::new(client.clone())),
            Arc::new(KubeEventRecorder::new(client, CONTROLLER_NAME)),
            config_store.clone(),
        ));

        // Start watchers in background tasks
        let watcher_instance = Arc::new(Watcher::new(queue.clone(), config_store.clone()));

        let namespace_watcher = {
            let watcher = Arc::clone(&watcher_instance);
            tokio::spawn(async move { watcher.watch_namespaces(namespace_api, namespace_writer).await })
        };

        let broker_watcher = {
            let watcher = Arc::clone(&watcher_instance);
            tokio::spawn(async move { watcher.watch_brokers(broker_api, broker_writer).await })
        };

        let mut config_watcher = {
            let watcher = watcher_instance;
            tokio::spawn(async move { watcher.watch_config(configmap_api).await })
        };

        // Hold the workers until both caches are primed, so early
        // reconciliations don't decide against an empty view
        namespace_store
            .wait_until_ready()
            .await
            .map_err(|e| ControllerError::Watch(format!("Namespace cache failed to sync: {e}")))?;
        broker_store
            .wait_until_ready()
            .await
            .map_err(|e| ControllerError::Watch(format!("Broker cache failed to sync: {e}")))?;

        // Also hold them until the initial config snapshot is in: reconciling
        // against the closed default while a configured selector is still in
        // flight would permanently skip namespaces, and the reverse ordering
        // (an open selector loading late) would permanently create brokers
        tokio::select! {
            () = config_store.wait_until_ready() => {}
            result = &mut config_watcher => {
                result.map_err(|e| {
                    ControllerError::Watch(format!("Config watcher panicked: {e}"))
                })??;
                return Err(ControllerError::Watch(
                    "Config watcher exited before initial sync".to_string(),
                ));
            }
        }
        info!("Caches and config synced, starting {} reconcile workers", worker_count);

        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let queue = queue.clone();
            let reconciler = Arc::clone(&reconciler);
            workers.push(tokio::spawn(async move {
                debug!("Reconcile worker {} started", id);
                while let Some(key) = queue.next().await {
                    match reconciler.reconcile(&key).await {
                        Ok(()) => queue.done(&key, false),
                        Err(e) if e.is_retryable() => {
                            warn!("Reconciliation of {} failed, requeueing: {}", key, e);
                            queue.done(&key, true);
                        }
                        Err(e) => {
                            error!("Reconciliation of {} failed permanently: {}", key, e);
                            queue.done(&key, false);
                        }
                    }
                }
                debug!("Reconcile worker {} stopped", id);
            }));
        }

        Ok(Self {
            namespace_watcher,
            broker_watcher,
            config_watcher,
            queue,
            workers,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Sugar controller running");

        // Wait for any watcher to exit (they should run forever)
        let result = tokio::select! {
            result = &mut self.namespace_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Namespace watcher panicked: {e}")))?
            }
            result = &mut self.broker_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Broker watcher panicked: {e}")))?
            }
            result = &mut self.config_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Config watcher panicked: {e}")))?
            }
        };

        // Let in-flight reconciliations finish before exiting
        self.queue.shutdown();
        for worker in self.workers {
            let _ = worker.await;
        }

        result
    }
}
