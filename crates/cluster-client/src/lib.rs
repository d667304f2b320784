//! Cluster Access Seams
//!
//! Abstractions over the Kubernetes surface the sugar controller touches:
//! cached read views ("listers") for Namespaces and Brokers, a mutating
//! client for creating Brokers, and an event recorder.
//!
//! The reconciler depends only on the traits in [`traits`], which keeps the
//! decision logic free of network concerns and testable against the
//! in-memory [`mock::MockCluster`] (behind the `test-util` feature). The
//! production implementations in [`kube_impl`] are thin wrappers over
//! `kube` reflector stores and API clients.

pub mod error;
pub mod kube_impl;
pub mod traits;
#[cfg(feature = "test-util")]
pub mod mock;

pub use error::ClientError;
pub use kube_impl::{KubeBrokerClient, KubeEventRecorder, StoreBrokerLister, StoreNamespaceLister};
pub use traits::{BrokerClient, BrokerLister, EventRecorder, NamespaceLister};
#[cfg(feature = "test-util")]
pub use mock::{CreateOutcome, MockCluster, RecordedEvent};
