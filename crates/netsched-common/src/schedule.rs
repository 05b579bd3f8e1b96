use serde::{Deserialize, Serialize};

use crate::ids::{JobId, LinkId};

/// A fixed ordered list of links serving one workload.
pub type Tunnel = Vec<LinkId>;

/// The persisted artefact produced by Phase 1 and mutated by Phase 2.
/// Created with `admit = false` when a job enters admission; never deleted.
///
/// Invariant (when `admit` is true): `tunnels.len() == bw_alloc.len()` and
/// equals the owning job's workload count; every allocated bandwidth lies
/// in `[0, workload.bw]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSchedule {
    pub job_id: JobId,
    pub admit: bool,
    pub start_time: u64,
    pub tunnels: Vec<Tunnel>,
    pub bw_alloc: Vec<f64>,
}

impl JobSchedule {
    /// A fresh, not-yet-admitted schedule for `job_id`.
    pub fn pending(job_id: JobId) -> Self {
        Self {
            job_id,
            admit: false,
            start_time: 0,
            tunnels: Vec::new(),
            bw_alloc: Vec::new(),
        }
    }

    pub fn is_coherent(&self, workload_count: usize) -> bool {
        if !self.admit {
            return true;
        }
        self.tunnels.len() == workload_count && self.bw_alloc.len() == workload_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let sched = JobSchedule {
            job_id: JobId(3),
            admit: true,
            start_time: 500,
            tunnels: vec![vec![LinkId(0), LinkId(1)]],
            bw_alloc: vec![40.0],
        };
        let encoded = serde_json::to_string(&sched).unwrap();
        let decoded: JobSchedule = serde_json::from_str(&encoded).unwrap();
        assert_eq!(sched, decoded);
        let reencoded = serde_json::to_string(&decoded).unwrap();
        assert_eq!(encoded, reencoded);
    }

    #[test]
    fn pending_schedule_is_trivially_coherent() {
        let sched = JobSchedule::pending(JobId(0));
        assert!(sched.is_coherent(3));
    }
}
