//! Readiness polling for workload pods.
//!
//! Readiness is two sequential phases: first the number of pods matching a
//! selector must equal the expected count, then every one of those pods must
//! individually report available. A pod set can reach its count long before
//! any pod is ready, so passing phase one alone proves nothing.

use tracing::{info, warn};

use crate::cluster::{ClusterClient, PodReadiness};
use crate::error::{Error, Result};
use crate::retry::{Observation, RetryPolicy, poll_until};
use crate::selector::LabelSelector;

/// Wait until exactly `expected` pods match `selector`.
///
/// Returns the matching pods from the successful observation.
pub async fn wait_for_pod_count<C: ClusterClient>(
    cluster: &C,
    namespace: &str,
    selector: &LabelSelector,
    expected: u32,
    policy: &RetryPolicy,
) -> Result<Vec<PodReadiness>> {
    let what = format!("{expected} pods matching {selector} in {namespace}");
    let expected = expected as usize;
    let pods = poll_until(policy, &what, move || async move {
        let pods = cluster.list_pods(namespace, selector).await?;
        if pods.len() == expected {
            Ok::<_, Error>(Observation::Ready(pods))
        } else {
            Ok::<_, Error>(Observation::Pending(format!(
                "observed {} of {} pods",
                pods.len(),
                expected
            )))
        }
    })
    .await?;
    info!(namespace = %namespace, selector = %selector, count = pods.len(), "Pod count reached");
    Ok(pods)
}

/// Wait until the named pod reports available.
pub async fn wait_for_pod_available<C: ClusterClient>(
    cluster: &C,
    namespace: &str,
    pod: &str,
    policy: &RetryPolicy,
) -> Result<()> {
    let what = format!("pod {namespace}/{pod} to be available");
    poll_until(policy, &what, move || async move {
        let readiness = cluster.pod_readiness(namespace, pod).await?;
        if readiness.available {
            Ok::<_, Error>(Observation::Ready(()))
        } else {
            Ok::<_, Error>(Observation::Pending(format!("pod {pod} not available")))
        }
    })
    .await?;
    info!(namespace = %namespace, pod = %pod, "Pod available");
    Ok(())
}

/// Count phase with `count_policy`, then availability of each matching pod
/// with `availability_policy`.
///
/// Pods are listed again once the count is reached, so a pod replaced
/// between the phases is checked under its new name.
pub async fn wait_until_ready_with<C: ClusterClient>(
    cluster: &C,
    namespace: &str,
    selector: &LabelSelector,
    expected: u32,
    count_policy: &RetryPolicy,
    availability_policy: &RetryPolicy,
) -> Result<()> {
    wait_for_pod_count(cluster, namespace, selector, expected, count_policy).await?;
    let pods = cluster.list_pods(namespace, selector).await?;
    if pods.len() != expected as usize {
        warn!(
            namespace = %namespace,
            selector = %selector,
            expected,
            observed = pods.len(),
            "Pod count changed after the count phase"
        );
    }
    for pod in &pods {
        wait_for_pod_available(cluster, namespace, &pod.name, availability_policy).await?;
    }
    info!(
        namespace = %namespace,
        selector = %selector,
        count = pods.len(),
        "All pods available"
    );
    Ok(())
}

/// Full readiness check with one budget for both phases.
pub async fn wait_until_ready<C: ClusterClient>(
    cluster: &C,
    namespace: &str,
    selector: &LabelSelector,
    expected: u32,
    policy: &RetryPolicy,
) -> Result<()> {
    wait_until_ready_with(cluster, namespace, selector, expected, policy, policy).await
}
