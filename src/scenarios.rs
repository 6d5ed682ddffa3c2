//! Post-install verification scenarios for the Aerospike blueprint.
//!
//! Scenarios run in a fixed order, each through [`Report::run`], so a failure
//! in one is recorded and the remaining scenarios still run.

use std::path::PathBuf;

use tracing::info;

use crate::cluster::{ClusterClient, ClusterTarget};
use crate::config::{
    AEROSPIKE_CLUSTER_KIND, AEROSPIKE_CLUSTER_NAME, AUTH_SECRET, FEATURES_AND_CERTS_SECRET,
    HarnessConfig, KARPENTER_REPLICAS, KUBE_SYSTEM_NAMESPACE, OPERATOR_REPLICAS,
};
use crate::error::{Error, Result};
use crate::poller::wait_until_ready;
use crate::report::Report;
use crate::scale::scale_up_and_down;
use crate::selector::Workload;

pub const CLUSTER_REACHABILITY: &str = "cluster_reachability";
pub const KARPENTER_CONTROLLER_PODS: &str = "karpenter_controller_pods";
pub const KARPENTER_CRDS: &str = "karpenter_crds";
pub const AKO_OPERATOR_PODS: &str = "ako_operator_pods";
pub const AEROSPIKE_SECRETS: &str = "aerospike_secrets";
pub const AEROSPIKE_PODS_RUNNING: &str = "aerospike_pods_running";
pub const AEROSPIKE_SCALE_UP_AND_DOWN: &str = "aerospike_scale_up_and_down";

/// Every scenario, in run order.
pub const ALL_SCENARIOS: [&str; 7] = [
    CLUSTER_REACHABILITY,
    KARPENTER_CONTROLLER_PODS,
    KARPENTER_CRDS,
    AKO_OPERATOR_PODS,
    AEROSPIKE_SECRETS,
    AEROSPIKE_PODS_RUNNING,
    AEROSPIKE_SCALE_UP_AND_DOWN,
];

/// Reject `--only` names that match no scenario.
pub fn check_selection(config: &HarnessConfig) -> Result<()> {
    let unknown: Vec<&str> = config
        .only
        .iter()
        .map(String::as_str)
        .filter(|name| !ALL_SCENARIOS.contains(name))
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(Error::invalid_config(format!(
            "unknown scenario(s): {} (known: {})",
            unknown.join(", "),
            ALL_SCENARIOS.join(", ")
        )))
    }
}

/// Scenarios bound to one cluster and one configuration.
pub struct BlueprintScenarios<'a, C> {
    cluster: &'a C,
    config: &'a HarnessConfig,
    /// Kubeconfig `cluster` was built from; scale targets carry it
    kubeconfig: PathBuf,
}

impl<'a, C: ClusterClient> BlueprintScenarios<'a, C> {
    pub fn new(cluster: &'a C, config: &'a HarnessConfig, kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            cluster,
            config,
            kubeconfig: kubeconfig.into(),
        }
    }

    /// Run every selected scenario in order, recording each outcome.
    pub async fn run_all(&self, report: &mut Report) {
        for name in ALL_SCENARIOS {
            if !self.config.selects(name) {
                info!(scenario = %name, "Skipping scenario");
                continue;
            }
            report.run(name, || self.run_one(name)).await;
        }
    }

    async fn run_one(&self, name: &str) -> Result<()> {
        match name {
            CLUSTER_REACHABILITY => self.cluster_reachability().await,
            KARPENTER_CONTROLLER_PODS => self.karpenter_controller_pods().await,
            KARPENTER_CRDS => self.karpenter_crds().await,
            AKO_OPERATOR_PODS => self.ako_operator_pods().await,
            AEROSPIKE_SECRETS => self.aerospike_secrets().await,
            AEROSPIKE_PODS_RUNNING => self.aerospike_pods_running().await,
            AEROSPIKE_SCALE_UP_AND_DOWN => self.aerospike_scale_up_and_down().await,
            other => Err(Error::invalid_config(format!("unknown scenario: {other}"))),
        }
    }

    /// The API server answers `get nodes`.
    pub async fn cluster_reachability(&self) -> Result<()> {
        let nodes = self
            .cluster
            .kubectl(KUBE_SYSTEM_NAMESPACE, &["get", "nodes"])
            .await?;
        info!(nodes = nodes.lines().count().saturating_sub(1), "Cluster reachable");
        Ok(())
    }

    pub async fn karpenter_controller_pods(&self) -> Result<()> {
        self.workload_ready(Workload::Karpenter, KARPENTER_REPLICAS)
            .await
    }

    /// Karpenter's NodePool and EC2NodeClass resources from the blueprint exist.
    pub async fn karpenter_crds(&self) -> Result<()> {
        let namespace = Workload::Karpenter.namespace();
        self.expect_output(namespace, "nodepool", "aerospike").await?;
        self.expect_output(namespace, "ec2nodeclass", "default")
            .await
    }

    pub async fn ako_operator_pods(&self) -> Result<()> {
        self.workload_ready(Workload::Operator, OPERATOR_REPLICAS)
            .await
    }

    /// Credentials and feature-key secrets are present in the database namespace.
    pub async fn aerospike_secrets(&self) -> Result<()> {
        let namespace = Workload::AerospikeCluster.namespace();
        for name in [AUTH_SECRET, FEATURES_AND_CERTS_SECRET] {
            if !self.cluster.secret_exists(namespace, name).await? {
                return Err(Error::SecretNotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                });
            }
            info!(namespace = %namespace, secret = %name, "Secret present");
        }
        Ok(())
    }

    pub async fn aerospike_pods_running(&self) -> Result<()> {
        self.workload_ready(Workload::AerospikeCluster, self.config.cluster_size)
            .await
    }

    /// Grow the database by one node, then shrink it back.
    pub async fn aerospike_scale_up_and_down(&self) -> Result<()> {
        let workload = Workload::AerospikeCluster;
        let target = ClusterTarget::new(
            &self.kubeconfig,
            workload.namespace(),
            AEROSPIKE_CLUSTER_KIND,
            AEROSPIKE_CLUSTER_NAME,
        );
        scale_up_and_down(
            self.cluster,
            &target,
            &workload.selector(),
            self.config.cluster_size,
            &self.config.retry,
        )
        .await
    }

    async fn workload_ready(&self, workload: Workload, expected: u32) -> Result<()> {
        wait_until_ready(
            self.cluster,
            workload.namespace(),
            &workload.selector(),
            expected,
            &self.config.retry,
        )
        .await
    }

    async fn expect_output(&self, namespace: &str, resource: &str, needle: &str) -> Result<()> {
        let output = self.cluster.kubectl(namespace, &["get", resource]).await?;
        if !output.contains(needle) {
            return Err(Error::unexpected_output(format!("kubectl get {resource}"), needle));
        }
        Ok(())
    }
}
