//! Kubernetes resource watchers.
//!
//! This module handles watching Namespaces, Brokers, and the sugar
//! ConfigMap. Namespace and Broker watches are driven through reflector
//! stores (the cached views the reconciler reads) and enqueue namespace
//! keys; no ordering is assumed between the two watches, since the
//! reconciler re-derives everything from cached state per key. The
//! ConfigMap watch hot-swaps the selector config.

use crate::config::{ConfigStore, SugarConfig, CONFIG_MAP_NAME};
use crate::error::ControllerError;
use crate::queue::WorkQueue;
use crds::Broker;
use futures::TryStreamExt;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace};
use kube::{Api, ResourceExt};
use kube_runtime::reflector::store::Writer;
use kube_runtime::{reflector, watcher};
use tracing::{debug, info, warn};

/// Watches cluster state and feeds the work queue and config store.
pub struct Watcher {
    queue: WorkQueue,
    config: ConfigStore,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(queue: WorkQueue, config: ConfigStore) -> Self {
        Self { queue, config }
    }

    /// Watch namespaces, keeping the cached view fresh and enqueueing every
    /// observed namespace by name.
    pub async fn watch_namespaces(
        &self,
        api: Api<Namespace>,
        writer: Writer<Namespace>,
    ) -> Result<(), ControllerError> {
        info!("Starting namespace watcher");

        let stream = reflector(writer, watcher(api, watcher::Config::default()));
        let mut stream = Box::pin(stream);

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| ControllerError::Watch(format!("Namespace watch stream error: {e}")))?
        {
            match event {
                watcher::Event::Apply(namespace) | watcher::Event::InitApply(namespace) => {
                    let name = namespace.name_any();
                    debug!("Namespace observed: {}", name);
                    self.queue.add(&name);
                }
                watcher::Event::Delete(namespace) => {
                    // Level-triggered: the reconciler resolves deletion as a
                    // terminal no-op from its own read
                    let name = namespace.name_any();
                    debug!("Namespace deleted: {}", name);
                    self.queue.add(&name);
                }
                watcher::Event::Init => {
                    debug!("Namespace watcher initializing");
                }
                watcher::Event::InitDone => {
                    info!("Namespace cache primed");
                }
            }
        }

        Ok(())
    }

    /// Watch brokers, keeping the cached view fresh and enqueueing the
    /// owning namespace of every observed broker.
    pub async fn watch_brokers(
        &self,
        api: Api<Broker>,
        writer: Writer<Broker>,
    ) -> Result<(), ControllerError> {
        info!("Starting broker watcher");

        let stream = reflector(writer, watcher(api, watcher::Config::default()));
        let mut stream = Box::pin(stream);

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| ControllerError::Watch(format!("Broker watch stream error: {e}")))?
        {
            match event {
                watcher::Event::Apply(broker)
                | watcher::Event::InitApply(broker)
                | watcher::Event::Delete(broker) => {
                    if let Some(namespace) = broker.namespace() {
                        debug!("Broker observed in namespace {}", namespace);
                        self.queue.add(&namespace);
                    }
                }
                watcher::Event::Init => {
                    debug!("Broker watcher initializing");
                }
                watcher::Event::InitDone => {
                    info!("Broker cache primed");
                }
            }
        }

        Ok(())
    }

    /// Watch the `config-sugar` ConfigMap and hot-swap the selector config.
    ///
    /// Malformed selectors and ConfigMap deletion keep the last good
    /// config in place.
    pub async fn watch_config(&self, api: Api<ConfigMap>) -> Result<(), ControllerError> {
        info!("Starting config watcher for {}", CONFIG_MAP_NAME);

        let config = watcher::Config::default().fields(&format!("metadata.name={CONFIG_MAP_NAME}"));
        let mut stream = Box::pin(watcher(api, config));

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| ControllerError::Watch(format!("Config watch stream error: {e}")))?
        {
            match event {
                watcher::Event::Apply(configmap) | watcher::Event::InitApply(configmap) => {
                    let data = configmap.data.unwrap_or_default();
                    match SugarConfig::from_configmap_data(&data) {
                        Ok(parsed) => {
                            info!(
                                "Applied {} (selector configured: {})",
                                CONFIG_MAP_NAME,
                                parsed.namespace_selector.is_some()
                            );
                            self.config.update(parsed);
                        }
                        Err(e) => {
                            warn!("Ignoring invalid {}: {}", CONFIG_MAP_NAME, e);
                        }
                    }
                }
                watcher::Event::Delete(_) => {
                    warn!("{} was deleted; keeping last known config", CONFIG_MAP_NAME);
                }
                watcher::Event::Init => {}
                watcher::Event::InitDone => {
                    // Initial state observed, including the ConfigMap being
                    // absent; workers may start
                    self.config.mark_ready();
                }
            }
        }

        Ok(())
    }
}
