//! Install and cleanup scripts, and the exactly-once cleanup guarantee.

use std::path::PathBuf;

use blueprint_e2e::bootstrap::{Bootstrap, ClusterLease};
use blueprint_e2e::command::CommandSpec;
use blueprint_e2e::error::{Error, Result};

use crate::common::Scripts;

#[tokio::test(flavor = "multi_thread")]
async fn test_install_then_release() {
    let scripts = Scripts::new("exit 0");

    let (lease, installed) = scripts.bootstrap().install().await;
    installed.unwrap();
    lease.release().await.unwrap();

    assert_eq!(scripts.log(), vec!["install", "cleanup"]);
}

/// Install exits non-zero after partially provisioning: cleanup still runs,
/// and only once.
#[tokio::test(flavor = "multi_thread")]
async fn test_failed_install_cleans_up_exactly_once() {
    let scripts = Scripts::new("exit 3");

    let (lease, installed) = scripts.bootstrap().install().await;
    assert!(matches!(installed, Err(Error::CommandFailed { .. })));
    lease.release().await.unwrap();

    assert_eq!(scripts.log(), vec!["install", "cleanup"]);
}

async fn run_that_bails_out(scripts: &Scripts) -> Result<()> {
    let (_lease, installed) = scripts.bootstrap().install().await;
    installed?;
    Err(Error::invalid_config("run aborted after install"))
}

/// An early return drops the lease without release; cleanup runs from Drop.
#[tokio::test(flavor = "multi_thread")]
async fn test_early_return_cleans_up_via_drop() {
    let scripts = Scripts::new("exit 0");

    let result = run_that_bails_out(&scripts).await;

    assert!(result.unwrap_err().is_fatal());
    assert_eq!(scripts.log(), vec!["install", "cleanup"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_install_script_still_cleans_up() {
    let scripts = Scripts::new("exit 0");
    let missing: PathBuf = scripts.path("does-not-exist.sh");
    let bootstrap = Bootstrap::new(
        CommandSpec::new(missing.to_string_lossy()),
        scripts.script("cleanup.sh"),
    );

    let (lease, installed) = bootstrap.install().await;
    assert!(matches!(installed, Err(Error::Spawn { .. })));
    drop(lease);

    assert_eq!(scripts.log(), vec!["cleanup"]);
}

/// A panic while the lease is held still tears the blueprint down.
#[test]
fn test_panic_while_holding_lease_cleans_up() {
    let scripts = Scripts::new("exit 0");
    let cleanup = scripts.script("cleanup.sh");

    let outcome = std::thread::spawn(move || {
        let _lease = ClusterLease::new(cleanup);
        let pods: Option<usize> = None;
        pods.expect("pod list was nil");
    })
    .join();

    assert!(outcome.is_err());
    assert_eq!(scripts.log(), vec!["cleanup"]);
}
