//! Default broker resource.

use crds::{Broker, BrokerSpec};

/// Fixed well-known name of the broker this controller creates.
pub const DEFAULT_BROKER_NAME: &str = "default";

/// Build the default broker for a namespace.
///
/// Empty spec on purpose: defaulting webhooks and the broker's own
/// controller fill in the rest, and this controller never touches the
/// object again.
pub fn default_broker(namespace: &str) -> Broker {
    let mut broker = Broker::new(DEFAULT_BROKER_NAME, BrokerSpec::default());
    broker.metadata.namespace = Some(namespace.to_string());
    broker
}
