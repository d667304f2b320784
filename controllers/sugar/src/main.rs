//! Sugar Controller
//!
//! Watches Kubernetes Namespaces and ensures a default `eventing.knative.dev`
//! Broker exists in every namespace that opts in via the configured label
//! selector (or the legacy `eventing.knative.dev/injection` label).
//!
//! The controller is level-triggered: every namespace or broker change simply
//! enqueues the namespace name, and the reconciler re-derives the desired
//! action from freshly read cached state each time.

mod backoff;
mod config;
mod controller;
mod error;
mod planner;
mod queue;
mod reconciler;
#[cfg(test)]
mod reconciler_test;
mod resources;
mod selector;
#[cfg(test)]
mod test_utils;
mod watcher;

use controller::Controller;
use std::env;
use tracing::info;

/// Workers draining the queue concurrently (distinct keys only).
const DEFAULT_WORKERS: usize = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting Sugar Controller");

    // Load configuration from environment variables
    let system_namespace = env::var("SYSTEM_NAMESPACE")
        .unwrap_or_else(|_| "knative-eventing".to_string());
    let workers = env::var("RECONCILE_WORKERS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_WORKERS);

    info!("Configuration:");
    info!("  System namespace: {}", system_namespace);
    info!("  Reconcile workers: {}", workers);

    // Initialize and run controller
    let controller = Controller::new(system_namespace, workers).await?;
    controller.run().await?;

    Ok(())
}
