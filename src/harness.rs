//! One end-to-end run of the blueprint.
//!
//! Install, kubeconfig update, connection, scenarios and cleanup, in that
//! order. Every step is recorded in the same [`Report`] as the scenarios.
//!
//! An install that exits non-zero is recorded as a failure and the run moves
//! on: whether scenarios run depends only on the kubeconfig update and the
//! connection succeeding. Once the install has started, cleanup runs exactly
//! once.

use std::future::Future;
use std::path::PathBuf;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::bootstrap::Bootstrap;
use crate::cluster::ClusterClient;
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::report::Report;
use crate::scenarios::BlueprintScenarios;

/// Suite name shown in the report.
pub const SUITE: &str = "aerospike blueprint";

pub const INSTALL_STEP: &str = "install";
pub const UPDATE_KUBECONFIG_STEP: &str = "update_kubeconfig";
pub const CONNECT_STEP: &str = "connect";
pub const CLEANUP_STEP: &str = "cleanup";

/// A configured run, ready to execute.
pub struct BlueprintRun<'a> {
    config: &'a HarnessConfig,
    kubeconfig: PathBuf,
    /// `None` when verifying an existing cluster
    bootstrap: Option<Bootstrap>,
}

impl<'a> BlueprintRun<'a> {
    /// Run with the install and cleanup scripts from `config`, or none at all
    /// when `config.skip_bootstrap` is set.
    pub fn new(config: &'a HarnessConfig, kubeconfig: impl Into<PathBuf>) -> Self {
        let bootstrap = (!config.skip_bootstrap).then(|| Bootstrap::from_config(config));
        Self {
            config,
            kubeconfig: kubeconfig.into(),
            bootstrap,
        }
    }

    /// Use these install and cleanup commands instead of the configured ones.
    pub fn with_bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    /// Execute the run and return its report.
    ///
    /// `refresh_kubeconfig` runs only when the blueprint was installed by this
    /// run. `connect` receives the kubeconfig path and builds the client the
    /// scenarios use.
    pub async fn execute<C, K, KFut, F, Fut>(self, refresh_kubeconfig: K, connect: F) -> Report
    where
        C: ClusterClient,
        K: FnOnce() -> KFut,
        KFut: Future<Output = Result<()>>,
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<C>>,
    {
        let mut report = Report::new(SUITE);

        let lease = match self.bootstrap {
            Some(ref bootstrap) => {
                let start = Instant::now();
                let (lease, installed) = bootstrap.install().await;
                if let Err(ref e) = installed {
                    warn!(error = %e, "Install failed, continuing with kubeconfig update");
                }
                report.record(
                    INSTALL_STEP,
                    installed.is_ok(),
                    start.elapsed(),
                    installed.err().map(|e| e.to_string()),
                );
                Some(lease)
            }
            None => {
                info!("Skipping install, using existing cluster");
                None
            }
        };

        let refreshed = if lease.is_some() {
            report
                .step(UPDATE_KUBECONFIG_STEP, refresh_kubeconfig())
                .await
        } else {
            Some(())
        };

        if refreshed.is_some()
            && let Some(cluster) = report
                .step(CONNECT_STEP, connect(self.kubeconfig.clone()))
                .await
        {
            BlueprintScenarios::new(&cluster, self.config, &self.kubeconfig)
                .run_all(&mut report)
                .await;
        } else {
            warn!("No cluster connection, skipping scenarios");
        }

        if let Some(lease) = lease {
            report.step(CLEANUP_STEP, lease.release()).await;
        }
        report
    }
}
