//! Formats admission and traffic-engineering results for downstream
//! measurement: per-job records for machine consumption, and a
//! newline-separated per-link utilisation stream for plotting.

use netsched_common::{Graph, JobSchedule, LinkId};
use serde::Serialize;

use crate::traffic_engineer::TrafficContext;

#[derive(Debug, Serialize)]
pub struct DemandRecord {
    pub demand_id: usize,
    pub path: Vec<u32>,
    pub bandwidth: f64,
}

#[derive(Debug, Serialize)]
pub struct JobRecord {
    pub job_id: u32,
    pub status: &'static str,
    pub start_time: u64,
    pub demands: Vec<DemandRecord>,
}

/// One line of the admission report: how many of how many test cases (or
/// jobs, for a single run) were admitted.
#[derive(Debug, Serialize)]
pub struct AdmissionReport {
    pub admitted: usize,
    pub total: usize,
    pub ratio: f64,
}

impl AdmissionReport {
    pub fn from_schedules(schedules: &[JobSchedule]) -> Self {
        let admitted = schedules.iter().filter(|s| s.admit).count();
        let total = schedules.len();
        let ratio = if total == 0 {
            0.0
        } else {
            admitted as f64 / total as f64
        };
        Self {
            admitted,
            total,
            ratio,
        }
    }
}

/// Renders the per-job record set expected by downstream tooling.
pub fn job_records(schedules: &[JobSchedule]) -> Vec<JobRecord> {
    schedules
        .iter()
        .map(|s| JobRecord {
            job_id: s.job_id.0,
            status: if s.admit { "admitted" } else { "rejected" },
            start_time: s.start_time,
            demands: s
                .tunnels
                .iter()
                .zip(&s.bw_alloc)
                .enumerate()
                .map(|(i, (tunnel, &bw))| DemandRecord {
                    demand_id: i,
                    path: tunnel.iter().map(|l| l.0).collect(),
                    bandwidth: bw,
                })
                .collect(),
        })
        .collect()
}

/// One `peak/capacity` utilisation value per link with any traffic,
/// sorted by link id for a deterministic stream.
pub fn link_utilization_report(ctx: &TrafficContext<'_>) -> Vec<f64> {
    let mut util = ctx.utilization();
    util.sort_by_key(|(l, _)| l.0);
    util.into_iter().map(|(_, u)| u).collect()
}

/// Every link in the graph, including links with no committed traffic
/// (reported as zero utilisation) — the superset view used by the
/// full-topology report.
pub fn full_link_utilization_report(graph: &Graph, ctx: &TrafficContext<'_>) -> Vec<(LinkId, f64)> {
    graph
        .links()
        .iter()
        .map(|l| {
            let capacity = l.capacity.max(1e-9);
            let peak = ctx.peak(l.id).bw;
            (l.id, peak / capacity)
        })
        .collect()
}
