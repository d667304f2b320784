//! Broker CRD
//!
//! The messaging Broker resource (`eventing.knative.dev/v1`) that the sugar
//! controller materializes inside opted-in namespaces. The controller only
//! ever creates brokers with an empty spec; richer specs belong to users and
//! other controllers.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "eventing.knative.dev",
    version = "v1",
    kind = "Broker",
    namespaced,
    status = "BrokerStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct BrokerSpec {
    /// Reference to the config that backs this broker (e.g. a ConfigMap)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<BrokerConfigReference>,
}

/// Reference to a namespaced configuration object for a broker.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrokerConfigReference {
    /// API version of the referenced object
    pub api_version: String,

    /// Kind of the referenced object
    pub kind: String,

    /// Name of the referenced object
    pub name: String,

    /// Namespace (defaults to the broker's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrokerStatus {
    /// Address where events can be delivered to this broker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Addressable>,

    /// Observed generation, set by the broker's own controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

/// Resolved ingress address of a broker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Addressable {
    /// URL of the broker ingress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
