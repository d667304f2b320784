//! Sugar configuration.
//!
//! The namespace selector lives in the `config-sugar` ConfigMap and is
//! hot-reloadable: the config watcher parses updates into [`SugarConfig`]
//! and swaps them into the shared [`ConfigStore`]. The reconciler reads a
//! fresh snapshot on every invocation and never caches one across
//! invocations.

use crate::error::ControllerError;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

/// Name of the watched ConfigMap in the system namespace.
pub const CONFIG_MAP_NAME: &str = "config-sugar";

/// ConfigMap data key holding the YAML-encoded label selector.
pub const NAMESPACE_SELECTOR_KEY: &str = "namespace-selector";

/// Admission policy for broker injection.
#[derive(Debug, Clone, Default)]
pub struct SugarConfig {
    /// Selector namespaces must satisfy to opt in. `None` (unconfigured)
    /// admits no namespace; a selector with no terms admits every namespace.
    pub namespace_selector: Option<LabelSelector>,
}

impl SugarConfig {
    /// Parse the configuration from ConfigMap data.
    ///
    /// A missing or blank `namespace-selector` key yields the default
    /// (closed) configuration; malformed YAML is an error so the caller can
    /// keep the last good config.
    pub fn from_configmap_data(
        data: &BTreeMap<String, String>,
    ) -> Result<Self, ControllerError> {
        let Some(raw) = data.get(NAMESPACE_SELECTOR_KEY) else {
            return Ok(Self::default());
        };
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let selector: LabelSelector = serde_yaml::from_str(raw).map_err(|e| {
            ControllerError::InvalidConfig(format!(
                "invalid {NAMESPACE_SELECTOR_KEY} in {CONFIG_MAP_NAME}: {e}"
            ))
        })?;

        Ok(Self {
            namespace_selector: Some(selector),
        })
    }
}

/// Shared, hot-swappable configuration snapshot.
///
/// The store starts not-ready; the config watcher marks it ready once the
/// initial ConfigMap state (present or absent) has been observed, and the
/// controller holds its workers until then. Without that gate a restart
/// would briefly reconcile against the closed default instead of the
/// operator's configured selector.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    inner: Arc<RwLock<SugarConfig>>,
    ready: Arc<watch::Sender<bool>>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(SugarConfig::default())
    }
}

impl ConfigStore {
    /// Create a store holding the given initial configuration.
    pub fn new(initial: SugarConfig) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            inner: Arc::new(RwLock::new(initial)),
            ready: Arc::new(ready),
        }
    }

    /// Current configuration snapshot.
    ///
    /// A poisoned lock still holds a coherent snapshot, so it is recovered
    /// rather than propagated.
    pub fn current(&self) -> SugarConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the stored configuration.
    pub fn update(&self, config: SugarConfig) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Mark the initial config state as observed. Idempotent.
    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    /// Wait until the initial config state has been observed.
    pub async fn wait_until_ready(&self) {
        let mut ready = self.ready.subscribe();
        while !*ready.borrow_and_update() {
            if ready.changed().await.is_err() {
                return;
            }
        }
    }
}
