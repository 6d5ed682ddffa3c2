//! Shared test infrastructure (used by functional and proptest).

#![allow(dead_code)]


pub use fake_cluster::{Call, FakeCluster, pod_name, replacement_pod_name};
pub use fixtures::*;
pub use scripts::{Scripts, append_line};
