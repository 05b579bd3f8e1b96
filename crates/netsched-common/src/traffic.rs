use serde::{Deserialize, Serialize};

use crate::ids::JobId;

/// One workload's contribution to a link's periodic traffic. Many of these
/// accumulate on a single link across many jobs; the owning job's current
/// start offset (tracked separately by the admission controller) shifts
/// `t_s`/`t_e` when evaluating peak bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkTrafficPattern {
    pub job_id: JobId,
    pub job_cycle: u64,
    pub t_s: u64,
    pub t_e: u64,
    pub bw: f64,
}

impl LinkTrafficPattern {
    /// True if this pattern (shifted by `offset`, modulo its own cycle) is
    /// active at job-local time `t`. `[t_s, t_e)` is half-open.
    pub fn active_at(&self, t: u64, offset: u64) -> bool {
        let offset = offset % self.job_cycle;
        let local = ((t % self.job_cycle) + self.job_cycle - offset) % self.job_cycle;
        local >= self.t_s && local < self.t_e
    }
}
