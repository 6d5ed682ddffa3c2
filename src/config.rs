//! Harness configuration.
//!
//! Names fixed by the blueprint are constants. Everything that varies per run
//! (retry budget, cluster size, script locations) lives in [`HarnessConfig`],
//! which is passed explicitly to each component.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Environment variables that must be set before a run starts.
pub const REQUIRED_ENV_VARS: [&str; 3] = [
    "TF_VAR_aerospike_admin_password",
    "TF_VAR_aerospike_secret_files_path",
    "AWS_DEFAULT_REGION",
];

/// Namespace used for cluster-level reachability checks
pub const KUBE_SYSTEM_NAMESPACE: &str = "kube-system";

/// Kind of the Aerospike custom resource
pub const AEROSPIKE_CLUSTER_KIND: &str = "aerospikecluster";

/// Name of the Aerospike custom resource created by the blueprint
pub const AEROSPIKE_CLUSTER_NAME: &str = "aerospikecluster";

/// Secret holding the Aerospike admin credentials
pub const AUTH_SECRET: &str = "auth-secret";

/// Secret holding the feature key file and TLS certificates
pub const FEATURES_AND_CERTS_SECRET: &str = "aerospike-secret";

/// Expected number of Karpenter controller pods
pub const KARPENTER_REPLICAS: u32 = 2;

/// Expected number of operator pods
pub const OPERATOR_REPLICAS: u32 = 2;

/// Default Aerospike cluster size declared by the blueprint
pub const DEFAULT_CLUSTER_SIZE: u32 = 2;

/// Terraform output naming the AWS region
pub const TF_OUTPUT_REGION: &str = "region";

/// Terraform output naming the EKS cluster
pub const TF_OUTPUT_CLUSTER_NAME: &str = "eks_cluster_name";

/// Per-run configuration.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    /// Budget for every readiness poll
    pub retry: RetryPolicy,
    /// Declared size of the Aerospike cluster after install
    pub cluster_size: u32,
    /// Directory holding the blueprint's Terraform state
    pub terraform_dir: PathBuf,
    /// Script that provisions the blueprint
    pub install_script: PathBuf,
    /// Script that tears the blueprint down
    pub cleanup_script: PathBuf,
    /// Kubeconfig to use; defaults to `$HOME/.kube/config`
    pub kubeconfig: Option<PathBuf>,
    /// Run against an already-provisioned cluster without install/cleanup
    pub skip_bootstrap: bool,
    /// Restrict the run to these scenarios (empty = all)
    pub only: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            cluster_size: DEFAULT_CLUSTER_SIZE,
            terraform_dir: PathBuf::from("../"),
            install_script: PathBuf::from("../install.sh"),
            cleanup_script: PathBuf::from("../cleanup.sh"),
            kubeconfig: None,
            skip_bootstrap: false,
            only: Vec::new(),
        }
    }
}

impl HarnessConfig {
    /// Reject configurations the run cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::invalid_config("retry attempts must be at least 1"));
        }
        if self.cluster_size == 0 {
            return Err(Error::invalid_config("cluster size must be at least 1"));
        }
        Ok(())
    }

    /// Whether the scenario named `name` should run.
    pub fn selects(&self, name: &str) -> bool {
        self.only.is_empty() || self.only.iter().any(|n| n == name)
    }
}
