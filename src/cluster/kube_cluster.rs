//! [`ClusterClient`] backed by the live cluster.
//!
//! Pods and secrets are read through kube-rs. Raw verbs (`get nodes`,
//! `get nodepool`) and the merge patch go through `kubectl`, pinned to the
//! same kubeconfig.

use std::path::{Path, PathBuf};

use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::{debug, info};

use super::{ClusterClient, ClusterTarget, PodReadiness};
use crate::command::CommandSpec;
use crate::error::{Error, Result};
use crate::selector::LabelSelector;

/// Pod is `Running` and every container is ready (and, where reported,
/// started). A pod with no container statuses yet is judged on phase alone.
pub fn is_pod_available(pod: &Pod) -> bool {
    let Some(status) = pod.status.as_ref() else {
        return false;
    };
    let containers_ready = status
        .container_statuses
        .as_ref()
        .is_none_or(|statuses| {
            statuses
                .iter()
                .all(|c| c.ready && c.started != Some(false))
        });
    containers_ready && status.phase.as_deref() == Some("Running")
}

fn pod_readiness(pod: &Pod) -> PodReadiness {
    PodReadiness::new(
        pod.metadata.name.clone().unwrap_or_default(),
        is_pod_available(pod),
    )
}

/// Live cluster reached through a kubeconfig file.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    kubeconfig: PathBuf,
}

impl KubeCluster {
    /// Build a client from the kubeconfig at `path`.
    pub async fn connect(path: &Path) -> Result<Self> {
        let kubeconfig = Kubeconfig::read_from(path)?;
        let config =
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        let client = Client::try_from(config)?;

        let version = client.apiserver_version().await?;
        info!(
            kubeconfig = %path.display(),
            "Connected to Kubernetes cluster: {} {}",
            version.platform,
            version.git_version
        );

        Ok(Self {
            client,
            kubeconfig: path.to_path_buf(),
        })
    }

    /// `kubectl --kubeconfig <path> --namespace <ns> <args...>`.
    pub fn kubectl_command(&self, namespace: &str, args: &[&str]) -> CommandSpec {
        kubectl_command(&self.kubeconfig, namespace, args)
    }
}

/// `kubectl` invocation pinned to a kubeconfig and namespace.
pub fn kubectl_command(kubeconfig: &Path, namespace: &str, args: &[&str]) -> CommandSpec {
    CommandSpec::new("kubectl")
        .arg("--kubeconfig")
        .arg(kubeconfig.to_string_lossy())
        .args(["--namespace", namespace])
        .args(args.iter().copied())
}

/// Reject a target that points at a different kubeconfig than the client's.
fn check_target(kubeconfig: &Path, target: &ClusterTarget) -> Result<()> {
    if target.kubeconfig.as_path() == kubeconfig {
        return Ok(());
    }
    Err(Error::invalid_config(format!(
        "{}/{} targets kubeconfig {} but the client uses {}",
        target.kind,
        target.name,
        target.kubeconfig.display(),
        kubeconfig.display()
    )))
}

impl ClusterClient for KubeCluster {
    async fn kubectl(&self, namespace: &str, args: &[&str]) -> Result<String> {
        self.kubectl_command(namespace, args).capture().await
    }

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<PodReadiness>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods
            .list(&ListParams::default().labels(&selector.to_string()))
            .await?;
        debug!(namespace = %namespace, selector = %selector, count = list.items.len(), "Listed pods");
        Ok(list.items.iter().map(pod_readiness).collect())
    }

    async fn pod_readiness(&self, namespace: &str, name: &str) -> Result<PodReadiness> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods.get(name).await?;
        Ok(pod_readiness(&pod))
    }

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(secrets.get_opt(name).await?.is_some())
    }

    async fn patch_merge(&self, target: &ClusterTarget, patch: &serde_json::Value) -> Result<()> {
        check_target(&self.kubeconfig, target)?;
        let payload = serde_json::to_string(patch)?;
        self.kubectl_command(
            &target.namespace,
            &[
                "patch",
                target.kind.as_str(),
                target.name.as_str(),
                "--type",
                "merge",
                "-p",
                payload.as_str(),
            ],
        )
        .capture()
        .await?;
        info!(
            namespace = %target.namespace,
            kind = %target.kind,
            name = %target.name,
            patch = %payload,
            "Patched resource"
        );
        Ok(())
    }
}
