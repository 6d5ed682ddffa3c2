//! Scale verification for the AerospikeCluster custom resource.
//!
//! A scale change is a merge patch of `spec.size` followed by a full
//! readiness cycle at the new size. While the operator converges the count
//! phase gets twice the usual attempts; per-pod availability keeps the
//! standard budget. A failed verification leaves the patch in place.

use serde_json::json;
use tracing::{info, warn};

use crate::cluster::{ClusterClient, ClusterTarget};
use crate::error::Result;
use crate::poller::wait_until_ready_with;
use crate::retry::RetryPolicy;
use crate::selector::LabelSelector;

/// Desired size for the resource named by a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScaleRequest {
    /// Custom resource name
    pub name: String,
    /// Desired `spec.size`
    pub size: u32,
}

impl ScaleRequest {
    /// Create a request.
    pub fn new(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// `{"spec": {"size": N}}`
    pub fn patch(&self) -> serde_json::Value {
        json!({ "spec": { "size": self.size } })
    }
}

/// Patch the requested resource, in the target's namespace and kind, to the
/// requested size and wait for `size` pods matching `selector` to be available.
pub async fn scale_cluster<C: ClusterClient>(
    cluster: &C,
    target: &ClusterTarget,
    selector: &LabelSelector,
    request: &ScaleRequest,
    policy: &RetryPolicy,
) -> Result<()> {
    info!(
        namespace = %target.namespace,
        kind = %target.kind,
        name = %request.name,
        size = request.size,
        "Scaling cluster"
    );
    cluster
        .patch_merge(&target.with_name(&request.name), &request.patch())
        .await?;

    wait_until_ready_with(
        cluster,
        &target.namespace,
        selector,
        request.size,
        &policy.doubled(),
        policy,
    )
    .await?;
    info!(name = %request.name, size = request.size, "Cluster converged");
    Ok(())
}

/// Scale from `size` to `size + 1` and back, verifying each transition.
///
/// Both directions use the same budget. The scale-down is issued even when
/// the scale-up did not verify; the first failure is returned.
pub async fn scale_up_and_down<C: ClusterClient>(
    cluster: &C,
    target: &ClusterTarget,
    selector: &LabelSelector,
    size: u32,
    policy: &RetryPolicy,
) -> Result<()> {
    let up = ScaleRequest::new(&target.name, size.saturating_add(1));
    let scaled_up = scale_cluster(cluster, target, selector, &up, policy).await;
    if let Err(ref e) = scaled_up {
        warn!(error = %e, "Scale-up did not verify, scaling back down anyway");
    }

    let down = ScaleRequest::new(&target.name, size);
    let scaled_down = scale_cluster(cluster, target, selector, &down, policy).await;
    scaled_up.and(scaled_down)
}
