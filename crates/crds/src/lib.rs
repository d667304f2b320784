//! Sugar Controller CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the namespace sugar controller.

pub mod broker;

pub use broker::*;
