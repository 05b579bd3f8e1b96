use serde::{Deserialize, Serialize};

use crate::ids::{JobId, NodeId};

/// A periodic source→destination flow within one job. Active during the
/// half-open interval `[t_s, t_e)` (epochs, modulo the owning job's cycle),
/// requesting `bw` Gbps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub src: NodeId,
    pub dst: NodeId,
    pub t_s: u64,
    pub t_e: u64,
    pub bw: f64,
}

impl Workload {
    pub fn duration(&self) -> u64 {
        self.t_e - self.t_s
    }
}

/// A job request: a stable id, a repetition period in epochs, and the
/// ordered workloads that repeat every `cycle` epochs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub cycle: u64,
    pub workloads: Vec<Workload>,
}

impl Job {
    /// Total bandwidth demand summed across all workloads — the sort key
    /// for the SJF scenario ordering.
    pub fn total_bandwidth(&self) -> f64 {
        self.workloads.iter().map(|w| w.bw).sum()
    }
}
