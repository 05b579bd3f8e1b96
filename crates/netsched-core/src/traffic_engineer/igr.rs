use netsched_common::{Job, JobSchedule, LinkId};

use crate::pathfinder::PathFinder;

use super::{tunnel_bottleneck, TrafficContext, TrafficEngineer};

/// One candidate path within a workload's group, carrying an integer
/// weight bounded by `max_weight` — IGR's "table entry".
struct GroupPath {
    links: Vec<LinkId>,
    bottleneck: f64,
    weight: u32,
}

/// Two-stage table-carving allocator. Stage A ("table carving") hands
/// each workload a share of the fixed path-table budget proportional to
/// its demand against the job's total demand. Stage B ("weight
/// refinement") binary-searches a per-group `max_weight` so the group's
/// paths' integer weights fit inside its table share, then iteratively
/// raises the allowed oversubscription `θ` (starting at 1.0, stepping by
/// `igr_oversub_increment` up to `igr_max_oversub_factor`) until a check
/// function passes: the group still has at least `min_paths_per_group`
/// usable paths, and no path's weight-proportional demand share exceeds
/// `θ` times its own bottleneck. Bandwidth is then allocated in two
/// sweeps — a 30%-of-demand guarantee split evenly, followed by a
/// proportional-to-weight sweep for the remainder. Falls back to the
/// single-path Greedy allocation for any workload IGR could not carry at
/// least half its demand on.
#[derive(Default)]
pub struct Igr;

impl Igr {
    fn group_paths(
        &self,
        ctx: &TrafficContext<'_>,
        pf: &PathFinder<'_>,
        src: netsched_common::NodeId,
        dst: netsched_common::NodeId,
        k: usize,
    ) -> Vec<GroupPath> {
        pf.find_multi_path(src, dst, k)
            .into_iter()
            .map(|links| {
                let bottleneck = tunnel_bottleneck(ctx, &links);
                GroupPath {
                    links,
                    bottleneck,
                    weight: 1,
                }
            })
            .filter(|p| p.bottleneck > 0.0)
            .collect()
    }

    /// Binary-searches the per-group max weight in `[1, config.igr_max_weight]`
    /// so `Σ weight_i <= budget`, assigning weights proportional to each
    /// path's bottleneck tempered by `spread_factor` (1.0 weights strictly
    /// by bottleneck; smaller values flatten the distribution toward an
    /// even split across paths, trading throughput for fairness).
    fn search_weights(
        paths: &mut [GroupPath],
        total_bottleneck: f64,
        budget: u32,
        max_weight_cap: u32,
        spread_factor: f64,
    ) {
        let n = paths.len() as f64;
        let mut lo = 1u32;
        let mut hi = max_weight_cap.max(1);
        let mut best = 1u32;
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            let sum: u32 = paths
                .iter()
                .map(|p| Self::path_weight(p, total_bottleneck, n, mid, spread_factor))
                .sum();
            if sum <= budget {
                best = mid;
                lo = mid + 1;
            } else {
                if mid == 0 {
                    break;
                }
                hi = mid - 1;
            }
        }
        for p in paths.iter_mut() {
            p.weight = Self::path_weight(p, total_bottleneck, n, best, spread_factor);
        }
    }

    fn path_weight(p: &GroupPath, total_bottleneck: f64, n: f64, max_weight: u32, spread_factor: f64) -> u32 {
        let proportional = (p.bottleneck / total_bottleneck) * max_weight as f64;
        let even = max_weight as f64 / n;
        let blended = spread_factor * proportional + (1.0 - spread_factor) * even;
        (blended.round() as u32).max(1)
    }

    /// Returns `true` once the group's current weights both fit the table
    /// share and satisfy the check function: enough surviving path
    /// diversity, and no path asked to carry more than `theta` times its
    /// own bottleneck under a weight-proportional demand split.
    fn passes_check(
        paths: &[GroupPath],
        demand: f64,
        theta: f64,
        min_paths_per_group: usize,
    ) -> bool {
        if paths.len() < min_paths_per_group {
            return false;
        }
        let total_weight: u32 = paths.iter().map(|p| p.weight).sum();
        if total_weight == 0 {
            return false;
        }
        paths.iter().all(|p| {
            let share = demand * (p.weight as f64 / total_weight as f64);
            share <= p.bottleneck.max(1e-9) * theta
        })
    }

    /// Stage B: binary-searches weights, then iteratively raises the
    /// allowed oversubscription `theta` until [`Self::passes_check`]
    /// passes or `igr_max_oversub_factor` is reached — spec.md §4.4's
    /// "increase θ until weights fit the budget and a check function
    /// passes" table-carving step.
    fn refine_weights(
        &self,
        paths: &mut [GroupPath],
        demand: f64,
        table_share: u32,
        config: &netsched_common::EngineConfig,
    ) {
        if paths.is_empty() {
            return;
        }
        let total_bottleneck: f64 = paths.iter().map(|p| p.bottleneck).sum();
        if total_bottleneck <= 0.0 {
            return;
        }

        let mut theta = 1.0f64;
        loop {
            let budget = ((table_share as f64) * theta).round().max(paths.len() as f64) as u32;
            Self::search_weights(
                paths,
                total_bottleneck,
                budget,
                config.igr_max_weight,
                config.igr_spread_factor,
            );
            if Self::passes_check(paths, demand, theta, config.igr_min_paths_per_group) {
                return;
            }
            if theta >= config.igr_max_oversub_factor {
                return;
            }
            theta = (theta + config.igr_oversub_increment).min(config.igr_max_oversub_factor);
        }
    }

    /// Two-sweep bandwidth allocation: 30% of demand split evenly across
    /// every path first (subject to its bottleneck), then the remainder
    /// distributed proportionally to weight.
    fn allocate_bandwidth(paths: &[GroupPath], demand: f64) -> Vec<f64> {
        if paths.is_empty() {
            return Vec::new();
        }
        let guarantee_total = demand * 0.3;
        let share = guarantee_total / paths.len() as f64;
        let mut allocs: Vec<f64> = paths.iter().map(|p| share.min(p.bottleneck)).collect();

        let carried: f64 = allocs.iter().sum();
        let mut remaining = (demand - carried).max(0.0);
        let total_weight: u32 = paths.iter().map(|p| p.weight).sum();
        if total_weight > 0 {
            for (alloc, p) in allocs.iter_mut().zip(paths) {
                if remaining <= 0.0 {
                    break;
                }
                let headroom = (p.bottleneck - *alloc).max(0.0);
                let share = remaining * (p.weight as f64 / total_weight as f64);
                let take = share.min(headroom);
                *alloc += take;
                remaining -= take;
            }
        }
        allocs
    }
}

impl TrafficEngineer for Igr {
    fn allocate(
        &mut self,
        ctx: &mut TrafficContext<'_>,
        jobs: &[Job],
        schedules: &[JobSchedule],
    ) -> Vec<Vec<f64>> {
        let mut results = Vec::with_capacity(jobs.len());
        let total_demand: f64 = jobs.iter().map(|j| j.total_bandwidth()).sum::<f64>().max(1e-9);

        for (job, sched) in jobs.iter().zip(schedules) {
            ctx.set_offset(job.id, sched.start_time);
            let pf = PathFinder::bounded(ctx.graph, ctx.config.max_search_states);
            let mut job_allocs = Vec::with_capacity(job.workloads.len());

            for w in &job.workloads {
                let table_share = ((w.bw / total_demand) * ctx.config.igr_table_size as f64)
                    .round()
                    .max(ctx.config.igr_min_paths_per_group as f64) as u32;

                let mut paths = self.group_paths(
                    ctx,
                    &pf,
                    w.src,
                    w.dst,
                    ctx.config.igr_min_ecmp_size.max(ctx.config.igr_min_paths_per_group),
                );

                if paths.len() < ctx.config.igr_min_paths_per_group || paths.is_empty() {
                    let single = sched
                        .tunnels
                        .get(job_allocs.len())
                        .cloned()
                        .unwrap_or_default();
                    let bottleneck = tunnel_bottleneck(ctx, &single);
                    let bw = w.bw.min(bottleneck).max(0.0);
                    ctx.commit_allocation(job.id, job.cycle, w.t_s, w.t_e, bw, &single);
                    job_allocs.push(bw);
                    continue;
                }

                self.refine_weights(&mut paths, w.bw, table_share, ctx.config);
                let allocs = Self::allocate_bandwidth(&paths, w.bw);
                let total: f64 = allocs.iter().sum();

                if total < 0.5 * w.bw {
                    tracing::warn!(job_id = ?job.id, "IGR allocation below half demand, falling back to greedy");
                    let single = sched
                        .tunnels
                        .get(job_allocs.len())
                        .cloned()
                        .unwrap_or_default();
                    let bottleneck = tunnel_bottleneck(ctx, &single);
                    let bw = w.bw.min(bottleneck).max(0.0);
                    ctx.commit_allocation(job.id, job.cycle, w.t_s, w.t_e, bw, &single);
                    job_allocs.push(bw);
                    continue;
                }

                let per_path: Vec<(Vec<LinkId>, f64)> = paths
                    .iter()
                    .zip(&allocs)
                    .map(|(p, &bw)| (p.links.clone(), bw))
                    .collect();
                ctx.commit_allocation_multi(job.id, job.cycle, w.t_s, w.t_e, &per_path);
                job_allocs.push(total);
            }
            results.push(job_allocs);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsched_common::{EngineConfig, Graph, JobId, NodeId, Workload};

    #[test]
    fn splits_demand_across_ecmp_paths() {
        let mut g = Graph::new();
        g.add_edge(NodeId(0), NodeId(1), 60.0);
        g.add_edge(NodeId(0), NodeId(1), 60.0);
        let config = EngineConfig::default();
        let mut ctx = TrafficContext::new(&g, &config);
        let job = Job {
            id: JobId(0),
            cycle: 1000,
            workloads: vec![Workload {
                src: NodeId(0),
                dst: NodeId(1),
                t_s: 0,
                t_e: 500,
                bw: 80.0,
            }],
        };
        let sched = JobSchedule {
            job_id: JobId(0),
            admit: true,
            start_time: 0,
            tunnels: vec![vec![LinkId(0)]],
            bw_alloc: vec![80.0],
        };
        let mut igr = Igr;
        let allocs = igr.allocate(&mut ctx, &[job], &[sched]);
        assert!(allocs[0][0] > 0.0);
    }
}
