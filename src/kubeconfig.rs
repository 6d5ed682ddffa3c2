//! Point local tooling at the freshly provisioned EKS cluster.
//!
//! Region and cluster name come from the blueprint's Terraform outputs; the
//! AWS CLI then merges the cluster's credentials into the default kubeconfig.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::CommandSpec;
use crate::config::{TF_OUTPUT_CLUSTER_NAME, TF_OUTPUT_REGION};
use crate::error::{Error, Result};

/// Values recorded by `terraform apply` that the harness needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerraformOutputs {
    /// AWS region the cluster lives in
    pub region: String,
    /// EKS cluster name
    pub cluster_name: String,
}

impl TerraformOutputs {
    /// Read the outputs from the Terraform state in `terraform_dir`.
    pub async fn read(terraform_dir: &Path) -> Result<Self> {
        let region = terraform_output(terraform_dir, TF_OUTPUT_REGION).await?;
        let cluster_name = terraform_output(terraform_dir, TF_OUTPUT_CLUSTER_NAME).await?;
        info!(region = %region, cluster = %cluster_name, "Read Terraform outputs");
        Ok(Self {
            region,
            cluster_name,
        })
    }
}

/// `terraform output -raw <name>` run inside `terraform_dir`.
pub fn terraform_output_command(terraform_dir: &Path, name: &str) -> CommandSpec {
    CommandSpec::new("terraform")
        .args(["output", "-no-color", "-raw"])
        .arg(name)
        .current_dir(terraform_dir)
}

async fn terraform_output(terraform_dir: &Path, name: &str) -> Result<String> {
    let value = terraform_output_command(terraform_dir, name)
        .capture()
        .await?
        .trim()
        .to_string();
    if value.is_empty() {
        return Err(Error::unexpected_output(
            format!("terraform output {name}"),
            "a non-empty value",
        ));
    }
    Ok(value)
}

/// `aws eks --region <region> update-kubeconfig --name <cluster>`.
pub fn update_kubeconfig_command(region: &str, cluster_name: &str) -> CommandSpec {
    CommandSpec::new("aws")
        .args(["eks", "--region", region, "update-kubeconfig", "--name", cluster_name])
}

/// Merge the cluster's credentials into the default kubeconfig.
pub async fn update_kubeconfig(outputs: &TerraformOutputs) -> Result<()> {
    update_kubeconfig_command(&outputs.region, &outputs.cluster_name)
        .stream()
        .await?;
    info!(cluster = %outputs.cluster_name, "Updated kubeconfig");
    Ok(())
}

/// Read the Terraform outputs in `terraform_dir` and update the kubeconfig
/// from them.
pub async fn refresh_kubeconfig(terraform_dir: &Path) -> Result<()> {
    let outputs = TerraformOutputs::read(terraform_dir).await?;
    update_kubeconfig(&outputs).await
}

/// `$HOME/.kube/config`.
pub fn default_kubeconfig_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::invalid_config("HOME is not set; cannot locate kubeconfig"))?;
    Ok(kubeconfig_path_in(Path::new(&home)))
}

/// Kubeconfig location under a given home directory.
pub fn kubeconfig_path_in(home: &Path) -> PathBuf {
    home.join(".kube").join("config")
}
