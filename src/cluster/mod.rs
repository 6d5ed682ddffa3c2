//! Cluster capability interface.
//!
//! The poller and scale verifier only see [`ClusterClient`], so they run
//! unchanged against the live blueprint ([`KubeCluster`]) or an in-memory
//! fake in tests.
//!
//! - `kube_cluster`: kube-rs for pods and secrets, `kubectl` for raw verbs
//!   and merge patches

pub mod kube_cluster;

pub use kube_cluster::{KubeCluster, is_pod_available};

use std::future::Future;
use std::path::PathBuf;

use crate::error::Result;
use crate::selector::LabelSelector;

/// Per-pod view used by the readiness poller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodReadiness {
    /// Pod name
    pub name: String,
    /// Running with every container ready
    pub available: bool,
}

impl PodReadiness {
    /// Create a pod view.
    pub fn new(name: impl Into<String>, available: bool) -> Self {
        Self {
            name: name.into(),
            available,
        }
    }
}

/// A named resource in a specific cluster and namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterTarget {
    /// Kubeconfig used to reach the cluster; must be the one the client was
    /// built from
    pub kubeconfig: PathBuf,
    /// Namespace of the resource
    pub namespace: String,
    /// Resource kind as understood by `kubectl`
    pub kind: String,
    /// Resource name
    pub name: String,
}

impl ClusterTarget {
    /// Create a target.
    pub fn new(
        kubeconfig: impl Into<PathBuf>,
        namespace: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kubeconfig: kubeconfig.into(),
            namespace: namespace.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Same cluster, namespace and kind, another resource.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// Operations the harness performs against a cluster.
pub trait ClusterClient {
    /// Run a raw cluster-CLI verb in `namespace`, returning stdout.
    fn kubectl(&self, namespace: &str, args: &[&str]) -> impl Future<Output = Result<String>>;

    /// List pods matching `selector`.
    fn list_pods(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> impl Future<Output = Result<Vec<PodReadiness>>>;

    /// Current readiness of a single pod.
    fn pod_readiness(&self, namespace: &str, name: &str)
    -> impl Future<Output = Result<PodReadiness>>;

    /// Whether a secret exists.
    fn secret_exists(&self, namespace: &str, name: &str) -> impl Future<Output = Result<bool>>;

    /// Apply a JSON merge patch to the resource `target` names.
    fn patch_merge(
        &self,
        target: &ClusterTarget,
        patch: &serde_json::Value,
    ) -> impl Future<Output = Result<()>>;
}
