//! Prints the Broker CRD manifest to stdout.
//!
//! Usage: `cargo run --bin crdgen > config/crds/broker.yaml`

use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&crds::Broker::crd())?);
    Ok(())
}
