//! Live verification of a provisioned Aerospike blueprint.

use blueprint_e2e::HarnessConfig;
use blueprint_e2e::cluster::KubeCluster;
use blueprint_e2e::config::REQUIRED_ENV_VARS;
use blueprint_e2e::harness::BlueprintRun;
use blueprint_e2e::kubeconfig::refresh_kubeconfig;
use blueprint_e2e::preconditions::check_env_vars;
use blueprint_e2e::scenarios::BlueprintScenarios;

use crate::{SharedBlueprintCluster, init_tracing, kubeconfig_path};

#[tokio::test]
#[ignore = "requires a provisioned blueprint"]
async fn test_cluster_reachable() {
    init_tracing();
    let shared = SharedBlueprintCluster::get().await;
    let cluster = shared.connect().await;
    let config = HarnessConfig::default();

    BlueprintScenarios::new(&cluster, &config, shared.kubeconfig())
        .cluster_reachability()
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a provisioned blueprint"]
async fn test_karpenter_ready() {
    init_tracing();
    let shared = SharedBlueprintCluster::get().await;
    let cluster = shared.connect().await;
    let config = HarnessConfig::default();
    let scenarios = BlueprintScenarios::new(&cluster, &config, shared.kubeconfig());

    scenarios.karpenter_controller_pods().await.unwrap();
    scenarios.karpenter_crds().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a provisioned blueprint"]
async fn test_operator_and_database_ready() {
    init_tracing();
    let shared = SharedBlueprintCluster::get().await;
    let cluster = shared.connect().await;
    let config = HarnessConfig::default();
    let scenarios = BlueprintScenarios::new(&cluster, &config, shared.kubeconfig());

    scenarios.ako_operator_pods().await.unwrap();
    scenarios.aerospike_secrets().await.unwrap();
    scenarios.aerospike_pods_running().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a provisioned blueprint; scales the database"]
async fn test_scale_round_trip() {
    init_tracing();
    let shared = SharedBlueprintCluster::get().await;
    let cluster = shared.connect().await;
    let config = HarnessConfig::default();

    BlueprintScenarios::new(&cluster, &config, shared.kubeconfig())
        .aerospike_scale_up_and_down()
        .await
        .unwrap();
}

/// Install, verify and tear down, exactly as the binary does.
#[tokio::test(flavor = "multi_thread")]
#[ignore = "provisions and destroys AWS infrastructure"]
async fn test_full_lifecycle() {
    init_tracing();
    check_env_vars(&REQUIRED_ENV_VARS).unwrap();
    let config = HarnessConfig::default();
    let terraform_dir = config.terraform_dir.as_path();

    let report = BlueprintRun::new(&config, kubeconfig_path())
        .execute(
            move || refresh_kubeconfig(terraform_dir),
            |path| async move { KubeCluster::connect(&path).await },
        )
        .await;

    report.finish().unwrap();
}
