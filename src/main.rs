//! blueprint-e2e - end-to-end verification of the Aerospike-on-EKS blueprint.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Checks preconditions and resolves configuration from flags and environment
//! - Installs the blueprint and updates the kubeconfig
//! - Runs the verification scenarios and prints the report
//! - Tears the blueprint down, even when scenarios fail

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use blueprint_e2e::cluster::KubeCluster;
use blueprint_e2e::config::{DEFAULT_CLUSTER_SIZE, REQUIRED_ENV_VARS};
use blueprint_e2e::harness::BlueprintRun;
use blueprint_e2e::kubeconfig::{default_kubeconfig_path, refresh_kubeconfig};
use blueprint_e2e::preconditions::check_env_vars;
use blueprint_e2e::retry::{DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};
use blueprint_e2e::scenarios::check_selection;
use blueprint_e2e::{HarnessConfig, Result, RetryPolicy};

/// Exit code when every scenario passed
const EXIT_PASSED: u8 = 0;
/// Exit code when at least one scenario or step failed
const EXIT_FAILED: u8 = 1;
/// Exit code when the run could not start
const EXIT_FATAL: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "blueprint-e2e",
    version,
    about = "Install, verify and tear down the Aerospike EKS blueprint"
)]
struct Cli {
    /// Observations per readiness poll
    #[arg(long, env = "BLUEPRINT_RETRY_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    retry_attempts: u32,

    /// Seconds between observations
    #[arg(long, env = "BLUEPRINT_RETRY_DELAY_SECS", default_value_t = DEFAULT_DELAY.as_secs())]
    retry_delay_secs: u64,

    /// Declared Aerospike cluster size
    #[arg(long, env = "BLUEPRINT_CLUSTER_SIZE", default_value_t = DEFAULT_CLUSTER_SIZE)]
    cluster_size: u32,

    /// Directory holding the blueprint's Terraform state
    #[arg(long, env = "BLUEPRINT_TERRAFORM_DIR", default_value = "../")]
    terraform_dir: PathBuf,

    /// Blueprint install script
    #[arg(long, env = "BLUEPRINT_INSTALL_SCRIPT", default_value = "../install.sh")]
    install_script: PathBuf,

    /// Blueprint cleanup script
    #[arg(long, env = "BLUEPRINT_CLEANUP_SCRIPT", default_value = "../cleanup.sh")]
    cleanup_script: PathBuf,

    /// Kubeconfig to use (default: $HOME/.kube/config)
    #[arg(long, env = "BLUEPRINT_KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Verify an already-provisioned cluster; no install, no cleanup
    #[arg(long)]
    skip_bootstrap: bool,

    /// Only run these scenarios (comma-separated)
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,

    /// Also write the report as JSON to this file
    #[arg(long, env = "BLUEPRINT_REPORT_FILE")]
    report_file: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn into_config(self) -> Result<HarnessConfig> {
        Ok(HarnessConfig {
            retry: RetryPolicy::new(
                self.retry_attempts,
                Duration::from_secs(self.retry_delay_secs),
            )?,
            cluster_size: self.cluster_size,
            terraform_dir: self.terraform_dir,
            install_script: self.install_script,
            cleanup_script: self.cleanup_script,
            kubeconfig: self.kubeconfig,
            skip_bootstrap: self.skip_bootstrap,
            only: self.only,
        })
    }
}

fn init_tracing(json: bool) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("blueprint_e2e=info".parse()?)
        .add_directive("kube=warn".parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.log_json) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::from(EXIT_FATAL);
    }

    match run(cli).await {
        Ok(true) => ExitCode::from(EXIT_PASSED),
        Ok(false) => ExitCode::from(EXIT_FAILED),
        Err(e) => {
            error!(error = %e, "Aborting run");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Returns whether every step and scenario passed. Errors are fatal: nothing
/// has been provisioned when one is returned.
async fn run(cli: Cli) -> Result<bool> {
    let report_file = cli.report_file.clone();
    let config = cli.into_config()?;
    config.validate()?;
    check_selection(&config)?;
    check_env_vars(&REQUIRED_ENV_VARS)?;
    let kubeconfig = match config.kubeconfig.clone() {
        Some(path) => path,
        None => default_kubeconfig_path()?,
    };

    info!(
        attempts = config.retry.max_attempts,
        delay = ?config.retry.delay,
        cluster_size = config.cluster_size,
        kubeconfig = %kubeconfig.display(),
        "Starting blueprint verification"
    );

    let terraform_dir = config.terraform_dir.as_path();
    let report = BlueprintRun::new(&config, kubeconfig)
        .execute(
            move || refresh_kubeconfig(terraform_dir),
            |path| async move { KubeCluster::connect(&path).await },
        )
        .await;

    if let Some(ref path) = report_file
        && let Err(e) = report.write_json(path)
    {
        error!(error = %e, path = %path.display(), "Failed to write report");
    }

    match report.finish() {
        Ok(()) => Ok(true),
        Err(summary) => {
            error!("{summary}");
            Ok(false)
        }
    }
}
