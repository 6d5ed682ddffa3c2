// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for blueprint-e2e.
//!
//! Uses proptest to generate random inputs and verify invariants.

#[path = "../common/mod.rs"]
mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;

use blueprint_e2e::error::Error;
use blueprint_e2e::poller::wait_for_pod_count;
use blueprint_e2e::retry::{Observation, RetryPolicy, poll_until};
use blueprint_e2e::scale::ScaleRequest;
use blueprint_e2e::selector::{LabelSelector, Workload};

use common::{AEROSPIKE_NS, FakeClusterBuilder};

/// Paused-clock runtime so minute-long delays cost nothing.
fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

/// Strategy for generating retry budgets (1-12 attempts).
fn any_policy() -> impl Strategy<Value = RetryPolicy> {
    (1..=12u32, 1..=120u64)
        .prop_map(|(attempts, secs)| RetryPolicy::new(attempts, Duration::from_secs(secs)).unwrap())
}

/// Strategy for picking one of the known workloads.
fn any_workload() -> impl Strategy<Value = Workload> {
    prop_oneof![
        Just(Workload::Karpenter),
        Just(Workload::Operator),
        Just(Workload::AerospikeCluster),
    ]
}

proptest! {
    /// The poller observes until the condition holds or the budget runs out,
    /// never more, and sleeps only between observations.
    #[test]
    fn poll_observes_at_most_max_attempts(policy in any_policy(), ready_at in 1..=20u32) {
        let rt = paused_runtime();
        let observations = AtomicU32::new(0);
        let counter = &observations;

        let (result, elapsed) = rt.block_on(async {
            let start = Instant::now();
            let result = poll_until(&policy, "condition", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n >= ready_at {
                    Ok::<_, Error>(Observation::Ready(n))
                } else {
                    Ok(Observation::Pending(format!("observation {n}")))
                }
            })
            .await;
            (result, start.elapsed())
        });

        let seen = observations.load(Ordering::SeqCst);
        prop_assert_eq!(seen, ready_at.min(policy.max_attempts));
        prop_assert_eq!(result.is_ok(), ready_at <= policy.max_attempts);
        prop_assert!(elapsed >= policy.delay * (seen - 1));
        prop_assert!(elapsed < policy.delay * (seen - 1) + Duration::from_secs(1));
        prop_assert!(elapsed <= policy.max_wait() + Duration::from_secs(1));
    }

    /// On exhaustion the error reports exactly the configured budget.
    #[test]
    fn timeout_reports_budget(policy in any_policy()) {
        let rt = paused_runtime();
        let result: blueprint_e2e::Result<()> = rt.block_on(poll_until(&policy, "never", || async {
            Ok::<_, Error>(Observation::Pending("still waiting".to_string()))
        }));

        match result {
            Err(Error::Timeout { attempts, last, .. }) => {
                prop_assert_eq!(attempts, policy.max_attempts);
                prop_assert_eq!(last, "still waiting");
            }
            other => {
                prop_assert!(false, "expected timeout, got {:?}", other);
            }
        }
    }

    /// The count phase succeeds exactly when the expected count is observed
    /// within the budget.
    #[test]
    fn count_phase_matches_scripted_counts(
        counts in prop::collection::vec(0..=4usize, 1..=8),
        expected in 0..=4u32,
        attempts in 1..=8u32,
    ) {
        let rt = paused_runtime();
        let cluster = FakeClusterBuilder::new()
            .pod_counts(AEROSPIKE_NS, counts.clone())
            .build();
        let policy = RetryPolicy::new(attempts, Duration::from_secs(60)).unwrap();
        let selector = Workload::AerospikeCluster.selector();

        let result = rt.block_on(wait_for_pod_count(
            &cluster,
            AEROSPIKE_NS,
            &selector,
            expected,
            &policy,
        ));

        // Observation i sees counts[i], then the last count repeats
        let last = *counts.last().unwrap();
        let reached = (0..attempts as usize)
            .map(|i| counts.get(i).copied().unwrap_or(last))
            .any(|c| c == expected as usize);
        prop_assert_eq!(result.is_ok(), reached);
        prop_assert!(cluster.list_calls(AEROSPIKE_NS) <= attempts as usize);
    }

    /// Doubling never shrinks a budget and keeps the delay.
    #[test]
    fn doubled_budget(policy in any_policy()) {
        let doubled = policy.doubled();
        prop_assert_eq!(doubled.max_attempts, policy.max_attempts * 2);
        prop_assert_eq!(doubled.delay, policy.delay);
        prop_assert!(doubled.max_wait() >= policy.max_wait());
    }

    /// Known selectors parse back to themselves, with or without padding.
    #[test]
    fn known_selectors_round_trip(workload in any_workload(), pad in " {0,3}") {
        let selector = workload.selector();
        let (key, value) = workload.label();
        let padded = format!("{pad}{key}{pad}={pad}{value}{pad}");

        let parsed: LabelSelector = padded.parse().unwrap();
        prop_assert_eq!(&parsed, &selector);
        prop_assert_eq!(parsed.workload(), workload);
    }

    /// Selectors for anything the blueprint does not deploy are rejected.
    #[test]
    fn unknown_selectors_rejected(key in "[a-z][a-z./-]{0,20}", value in "[a-z][a-z0-9-]{0,20}") {
        let known = Workload::ALL.iter().any(|w| w.label() == (key.as_str(), value.as_str()));
        let parsed = format!("{key}={value}").parse::<LabelSelector>();
        prop_assert_eq!(parsed.is_ok(), known);
    }

    /// Strings without exactly one `=` never parse.
    #[test]
    fn malformed_selectors_rejected(s in "[a-z./-]{0,30}") {
        prop_assert!(s.parse::<LabelSelector>().is_err());
        let doubled = format!("{s}=a=b");
        prop_assert!(doubled.parse::<LabelSelector>().is_err());
    }

    /// The patch payload always carries the requested size and nothing else.
    #[test]
    fn patch_payload_carries_size(size in 1..=64u32) {
        let patch = ScaleRequest::new("aerospikecluster", size).patch();
        prop_assert_eq!(patch.pointer("/spec/size").and_then(|v| v.as_u64()), Some(u64::from(size)));
        prop_assert_eq!(patch.as_object().map(|o| o.len()), Some(1));
    }
}
