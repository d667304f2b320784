//! Test utilities for unit testing the reconciler
//!
//! This module provides helpers for creating test namespaces, selectors,
//! and a wired-up reconciler over the in-memory mock cluster.

use crate::config::{ConfigStore, SugarConfig};
use crate::reconciler::Reconciler;
use cluster_client::MockCluster;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, LabelSelectorRequirement, ObjectMeta, Time,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Build a label map from string pairs.
pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Helper to create a test Namespace, optionally labeled.
pub fn test_namespace(name: &str, label_pairs: &[(&str, &str)]) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: (!label_pairs.is_empty()).then(|| labels(label_pairs)),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Helper to create a test Namespace marked for deletion.
pub fn deleted_namespace(name: &str) -> Namespace {
    let mut namespace = test_namespace(name, &[]);
    namespace.metadata.deletion_timestamp = Some(Time(k8s_openapi::chrono::Utc::now()));
    namespace
}

/// Selector with a single `In` match expression.
pub fn selector_in(key: &str, values: &[&str]) -> LabelSelector {
    LabelSelector {
        match_expressions: Some(vec![LabelSelectorRequirement {
            key: key.to_string(),
            operator: "In".to_string(),
            values: Some(values.iter().map(|v| v.to_string()).collect()),
        }]),
        ..Default::default()
    }
}

/// Selector with only `matchLabels` pairs.
pub fn selector_with_labels(pairs: &[(&str, &str)]) -> LabelSelector {
    LabelSelector {
        match_labels: Some(labels(pairs)),
        ..Default::default()
    }
}

/// Wire a reconciler over a mock cluster with the given selector config.
pub fn test_reconciler(
    cluster: &MockCluster,
    namespace_selector: Option<LabelSelector>,
) -> (Reconciler, ConfigStore) {
    let config = ConfigStore::new(SugarConfig { namespace_selector });
    let reconciler = Reconciler::new(
        Arc::new(cluster.clone()),
        Arc::new(cluster.clone()),
        Arc::new(cluster.clone()),
        Arc::new(cluster.clone()),
        config.clone(),
    );
    (reconciler, config)
}
