//! Phase-2 traffic engineering: given admitted jobs with fixed tunnels and
//! start offsets, assign each workload a carried bandwidth (≤ its demand)
//! maximising total throughput subject to per-link capacity at every
//! traffic change-point.
//!
//! Unlike Phase 1, nothing here needs a rollback journal: every variant
//! only reads the shared peak-bandwidth engine while deciding an
//! allocation, and commits by appending a pattern once the decision is
//! final — a failed LP attempt simply falls back to Greedy before
//! anything is written.

pub mod greedy;
pub mod igr;
pub mod lp;
pub mod ncflow;

use std::collections::HashMap;

use netsched_common::{EngineConfig, Graph, Job, JobId, JobSchedule, LinkId, LinkTrafficPattern};

use crate::peak::{PeakBandwidth, PeakEngine};

/// Per-workload carried-bandwidth decision produced by a Phase-2 variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub bw: f64,
}

/// Capability interface implemented by every Phase-2 variant.
pub trait TrafficEngineer {
    /// Allocates carried bandwidth for every workload of every admitted
    /// job. `jobs` and `schedules` are parallel slices (same order, same
    /// length) — `schedules[i]` must have `admit == true` and carry the
    /// fixed tunnels placed for `jobs[i]`. Returns one allocation vector
    /// per job, parallel to its workload list.
    fn allocate(
        &mut self,
        ctx: &mut TrafficContext<'_>,
        jobs: &[Job],
        schedules: &[JobSchedule],
    ) -> Vec<Vec<f64>>;
}

/// Owns the per-link traffic-pattern tables Phase 2 rebuilds from the
/// persisted schedule — Phase 1's own tables are not reused.
pub struct TrafficContext<'a> {
    pub graph: &'a Graph,
    pub config: &'a EngineConfig,
    patterns: HashMap<LinkId, Vec<LinkTrafficPattern>>,
    offsets: HashMap<JobId, u64>,
}

impl<'a> TrafficContext<'a> {
    pub fn new(graph: &'a Graph, config: &'a EngineConfig) -> Self {
        Self {
            graph,
            config,
            patterns: HashMap::new(),
            offsets: HashMap::new(),
        }
    }

    pub fn capacity(&self, link: LinkId) -> f64 {
        self.graph.link(link).map(|l| l.capacity).unwrap_or(0.0)
    }

    pub fn patterns(&self, link: LinkId) -> &[LinkTrafficPattern] {
        self.patterns
            .get(&link)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_offset(&mut self, job: JobId, offset: u64) {
        self.offsets.insert(job, offset);
    }

    pub fn offset(&self, job: JobId) -> u64 {
        self.offsets.get(&job).copied().unwrap_or(0)
    }

    pub fn peak(&self, link: LinkId) -> PeakBandwidth {
        PeakEngine::new(self.config).peak(self.patterns(link), &self.offsets)
    }

    pub fn peak_in_window(
        &self,
        link: LinkId,
        window_t_s: u64,
        window_t_e: u64,
        window_cycle: u64,
    ) -> PeakBandwidth {
        PeakEngine::new(self.config).peak_in_window(
            self.patterns(link),
            &self.offsets,
            window_t_s,
            window_t_e,
            window_cycle,
        )
    }

    /// Commits a workload's carried bandwidth onto every link of its
    /// tunnel. Called once a variant has decided the final allocation.
    pub fn commit_allocation(
        &mut self,
        job_id: JobId,
        job_cycle: u64,
        t_s: u64,
        t_e: u64,
        bw: f64,
        tunnel: &[LinkId],
    ) {
        if bw <= 0.0 {
            return;
        }
        let pattern = LinkTrafficPattern {
            job_id,
            job_cycle,
            t_s,
            t_e,
            bw,
        };
        for &link in tunnel {
            self.patterns.entry(link).or_default().push(pattern);
        }
    }

    /// Commits a workload's carried bandwidth split across several paths,
    /// one pattern per path. Used by IGR, which spreads a workload over
    /// its group's whole path table rather than a single tunnel.
    pub fn commit_allocation_multi(
        &mut self,
        job_id: JobId,
        job_cycle: u64,
        t_s: u64,
        t_e: u64,
        allocations: &[(Vec<LinkId>, f64)],
    ) {
        for (tunnel, bw) in allocations {
            self.commit_allocation(job_id, job_cycle, t_s, t_e, *bw, tunnel);
        }
    }

    /// Shrinks the most recently committed pattern belonging to `job_id`
    /// on `link` to `new_bw`. Used by NCFlow's cleanup pass; returns the
    /// prior bandwidth, or `None` if no such pattern exists.
    pub fn shrink_last_pattern_for_job(
        &mut self,
        link: LinkId,
        job_id: JobId,
        new_bw: f64,
    ) -> Option<f64> {
        let list = self.patterns.get_mut(&link)?;
        let entry = list.iter_mut().rev().find(|p| p.job_id == job_id)?;
        let prior = entry.bw;
        entry.bw = new_bw;
        Some(prior)
    }

    /// Utilisation (`peak/capacity`) for every link that has any
    /// contributing pattern.
    pub fn utilization(&self) -> Vec<(LinkId, f64)> {
        self.patterns
            .keys()
            .map(|&link| {
                let peak = self.peak(link);
                let capacity = self.capacity(link).max(1e-9);
                (link, peak.bw / capacity)
            })
            .collect()
    }
}

/// Per-link bottleneck residual (`capacity - peak`) for a tunnel, using
/// the whole-cycle peak — the convention shared by Greedy, NCFlow and IGR.
pub fn tunnel_bottleneck(ctx: &TrafficContext<'_>, tunnel: &[LinkId]) -> f64 {
    tunnel
        .iter()
        .map(|&l| (ctx.capacity(l) - ctx.peak(l).bw).max(0.0))
        .fold(f64::INFINITY, f64::min)
}

/// Per-link bottleneck residual restricted to the workload's own active
/// window — the convention used by the "Ours" LP variant.
pub fn tunnel_bottleneck_in_window(
    ctx: &TrafficContext<'_>,
    tunnel: &[LinkId],
    t_s: u64,
    t_e: u64,
    cycle: u64,
) -> f64 {
    tunnel
        .iter()
        .map(|&l| (ctx.capacity(l) - ctx.peak_in_window(l, t_s, t_e, cycle).bw).max(0.0))
        .fold(f64::INFINITY, f64::min)
}
