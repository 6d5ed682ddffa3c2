//! Label selectors for the workloads the blueprint deploys.
//!
//! The harness only ever waits on three workloads, so a selector is only
//! accepted if it names one of them.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Workloads whose pods the harness waits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Workload {
    /// Karpenter node autoscaler controller
    Karpenter,
    /// Aerospike Kubernetes Operator
    Operator,
    /// Aerospike database pods owned by the AerospikeCluster custom resource
    AerospikeCluster,
}

impl Workload {
    /// All known workloads.
    pub const ALL: [Workload; 3] = [
        Workload::Karpenter,
        Workload::Operator,
        Workload::AerospikeCluster,
    ];

    /// The `(key, value)` label identifying this workload's pods.
    pub fn label(&self) -> (&'static str, &'static str) {
        match self {
            Workload::Karpenter => ("app.kubernetes.io/name", "karpenter"),
            Workload::Operator => ("app", "aerospike-kubernetes-operator"),
            Workload::AerospikeCluster => ("aerospike.com/cr", "aerospikecluster"),
        }
    }

    /// Namespace the blueprint installs this workload into.
    pub fn namespace(&self) -> &'static str {
        match self {
            Workload::Karpenter => "karpenter",
            Workload::Operator => "aerospike-operator",
            Workload::AerospikeCluster => "aerospike",
        }
    }

    /// Selector matching this workload's pods.
    pub fn selector(&self) -> LabelSelector {
        let (key, value) = self.label();
        LabelSelector {
            key: key.to_string(),
            value: value.to_string(),
            workload: *self,
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workload::Karpenter => write!(f, "karpenter"),
            Workload::Operator => write!(f, "aerospike-operator"),
            Workload::AerospikeCluster => write!(f, "aerospike-cluster"),
        }
    }
}

/// A validated `key=value` label selector for one of the known workloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSelector {
    key: String,
    value: String,
    workload: Workload,
}

impl LabelSelector {
    /// Label key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Label value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Workload this selector identifies.
    pub fn workload(&self) -> Workload {
        self.workload
    }
}

impl FromStr for LabelSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| Error::invalid_selector(format!("{s:?} is not of the form key=value")))?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() || value.contains('=') {
            return Err(Error::invalid_selector(format!(
                "{s:?} is not of the form key=value"
            )));
        }

        Workload::ALL
            .iter()
            .find(|w| w.label() == (key, value))
            .map(Workload::selector)
            .ok_or_else(|| Error::invalid_selector(format!("{s:?} does not match a known workload")))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
