//! Blueprint install and guaranteed teardown.
//!
//! [`Bootstrap::install`] hands back a [`ClusterLease`] whether or not the
//! install script succeeded: a half-provisioned blueprint still has to be torn
//! down. The lease runs the cleanup script when released, or from `Drop` if
//! the run ends early. Cleanup runs at most once per lease.
//!
//! Dropping an unreleased lease inside a tokio runtime blocks via
//! `block_in_place`, so async callers must use the multi-threaded runtime.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, error, info, warn};

use crate::command::CommandSpec;
use crate::config::HarnessConfig;
use crate::error::Result;

/// Install and cleanup invocations for the blueprint.
#[derive(Clone, Debug)]
pub struct Bootstrap {
    install: CommandSpec,
    cleanup: CommandSpec,
}

impl Bootstrap {
    /// Create from explicit install and cleanup commands.
    pub fn new(install: CommandSpec, cleanup: CommandSpec) -> Self {
        Self { install, cleanup }
    }

    /// Use the install/cleanup scripts named in the configuration.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(
            CommandSpec::new(config.install_script.to_string_lossy()),
            CommandSpec::new(config.cleanup_script.to_string_lossy()),
        )
    }

    /// Run the install script, streaming its output.
    ///
    /// The lease is registered before the script starts, so it is returned
    /// together with the install result and must be kept alive for the run.
    pub async fn install(&self) -> (ClusterLease, Result<()>) {
        let lease = ClusterLease::new(self.cleanup.clone());
        info!(script = %self.install.display(), "Installing blueprint");
        let result = self.install.stream().await;
        match result {
            Ok(()) => info!("Blueprint installed"),
            Err(ref e) => error!(error = %e, "Blueprint install failed"),
        }
        (lease, result)
    }
}

/// Ownership of a provisioned blueprint. Tears it down exactly once.
#[derive(Debug)]
pub struct ClusterLease {
    cleanup: CommandSpec,
    /// Set once cleanup has started
    released: AtomicBool,
}

impl ClusterLease {
    /// Register `cleanup` to run when this lease ends.
    pub fn new(cleanup: CommandSpec) -> Self {
        Self {
            cleanup,
            released: AtomicBool::new(false),
        }
    }

    /// Whether cleanup has already run (or started).
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Run the cleanup script now.
    pub async fn release(self) -> Result<()> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(script = %self.cleanup.display(), "Tearing down blueprint");
        let result = self.cleanup.stream().await;
        if let Err(ref e) = result {
            error!(error = %e, "Blueprint cleanup failed");
        }
        result
    }
}

impl Drop for ClusterLease {
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        warn!(script = %self.cleanup.display(), "Lease dropped without release, tearing down");
        let cleanup = &self.cleanup;
        let result = match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(cleanup.stream()))
            }
            Ok(_) | Err(_) => {
                debug!("No multi-threaded runtime, running cleanup synchronously");
                cleanup.stream_blocking()
            }
        };
        if let Err(e) = result {
            error!(error = %e, "Blueprint cleanup failed");
        }
    }
}
