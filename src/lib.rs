//! End-to-end verification harness for the Aerospike-on-EKS blueprint.
//!
//! A run provisions the blueprint with its install script, points `kubectl`
//! at the new cluster, checks that Karpenter, the Aerospike Kubernetes
//! Operator and the Aerospike database come up healthy, exercises a scale
//! round trip on the database, and tears everything down again.
//!
//! - [`preconditions`]: required environment variables
//! - [`bootstrap`]: install script and the [`bootstrap::ClusterLease`] that guarantees cleanup
//! - [`kubeconfig`]: Terraform outputs and `aws eks update-kubeconfig`
//! - [`cluster`]: the [`cluster::ClusterClient`] seam and its live implementation
//! - [`poller`]: count-then-availability readiness checks
//! - [`scale`]: merge-patch scaling with convergence checks
//! - [`scenarios`] and [`report`]: the ordered scenario list and its PASS/FAIL table
//! - [`harness`]: one full run, from install to cleanup

pub mod bootstrap;
pub mod cluster;
pub mod command;
pub mod config;
pub mod error;
pub mod harness;
pub mod kubeconfig;
pub mod poller;
pub mod preconditions;
pub mod report;
pub mod retry;
pub mod scale;
pub mod scenarios;
pub mod selector;

pub use config::HarnessConfig;
pub use error::{Error, Result};
pub use retry::RetryPolicy;
