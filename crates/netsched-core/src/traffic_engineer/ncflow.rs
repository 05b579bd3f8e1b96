use std::collections::HashMap;

use netsched_common::{Job, JobId, JobSchedule, LinkId};

use super::{tunnel_bottleneck, TrafficContext, TrafficEngineer};

/// Priority-weighted allocation with a utilisation cleanup pass. Jobs with
/// a smaller cycle and fewer workloads get a higher priority
/// (`1/(cycle·workload_count)`) and are processed first, each guaranteed
/// at least `demand·priority_share` of its declared demand whenever the
/// bottleneck allows it. After every job has an initial allocation, any
/// link left above the configured utilisation threshold has its
/// lowest-priority contributor trimmed — never below that contributor's
/// own guarantee — until the link clears the threshold or no reducible
/// contributor remains.
#[derive(Default)]
pub struct NcFlow {
    priority: HashMap<JobId, f64>,
    guarantee: HashMap<JobId, f64>,
}

fn priority_of(job: &Job) -> f64 {
    let workload_count = job.workloads.len().max(1) as f64;
    1.0 / (job.cycle.max(1) as f64 * workload_count)
}

impl TrafficEngineer for NcFlow {
    fn allocate(
        &mut self,
        ctx: &mut TrafficContext<'_>,
        jobs: &[Job],
        schedules: &[JobSchedule],
    ) -> Vec<Vec<f64>> {
        let mut order: Vec<usize> = (0..jobs.len()).collect();
        for (i, job) in jobs.iter().enumerate() {
            self.priority.insert(job.id, priority_of(job));
            let _ = i;
        }
        order.sort_by(|&a, &b| {
            self.priority[&jobs[b].id]
                .partial_cmp(&self.priority[&jobs[a].id])
                .unwrap()
        });

        let mut allocs: Vec<Vec<f64>> = vec![Vec::new(); jobs.len()];
        for &idx in &order {
            let job = &jobs[idx];
            let sched = &schedules[idx];
            ctx.set_offset(job.id, sched.start_time);
            let priority_share = self.priority[&job.id] / (self.priority[&job.id] + 1.0);

            let mut job_allocs = Vec::with_capacity(job.workloads.len());
            for (w, tunnel) in job.workloads.iter().zip(&sched.tunnels) {
                let bottleneck = tunnel_bottleneck(ctx, tunnel);
                let guarantee = (w.bw * priority_share).min(bottleneck).max(0.0);
                let bw = w.bw.min(bottleneck).max(0.0);
                self.guarantee.insert(job.id, guarantee);
                ctx.commit_allocation(job.id, job.cycle, w.t_s, w.t_e, bw, tunnel);
                job_allocs.push(bw);
            }
            allocs[idx] = job_allocs;
        }

        self.cleanup(ctx, jobs, schedules, &mut allocs);
        allocs
    }
}

impl NcFlow {
    fn cleanup(
        &self,
        ctx: &mut TrafficContext<'_>,
        jobs: &[Job],
        schedules: &[JobSchedule],
        allocs: &mut [Vec<f64>],
    ) {
        let threshold = ctx.config.ncflow_cleanup_utilization_threshold;
        let links: Vec<LinkId> = ctx.utilization().into_iter().map(|(l, _)| l).collect();

        for link in links {
            let mut guard = 0;
            while guard < 64 {
                guard += 1;
                let capacity = ctx.capacity(link).max(1e-9);
                let util = ctx.peak(link).bw / capacity;
                if util <= threshold {
                    break;
                }
                let lowest = ctx
                    .patterns(link)
                    .iter()
                    .map(|p| p.job_id)
                    .min_by(|a, b| {
                        self.priority
                            .get(a)
                            .unwrap_or(&0.0)
                            .partial_cmp(self.priority.get(b).unwrap_or(&0.0))
                            .unwrap()
                    });
                let job_id = match lowest {
                    Some(j) => j,
                    None => break,
                };
                let guarantee = self.guarantee.get(&job_id).copied().unwrap_or(0.0);
                let current = ctx
                    .patterns(link)
                    .iter()
                    .rev()
                    .find(|p| p.job_id == job_id)
                    .map(|p| p.bw)
                    .unwrap_or(0.0);
                if current <= guarantee + 1e-9 {
                    break;
                }
                let reduced = (current * 0.9).max(guarantee);
                ctx.shrink_last_pattern_for_job(link, job_id, reduced);

                if let Some(job_idx) = jobs.iter().position(|j| j.id == job_id) {
                    if let Some(sched) = schedules.get(job_idx) {
                        for (wi, tunnel) in sched.tunnels.iter().enumerate() {
                            if tunnel.contains(&link) {
                                if let Some(a) = allocs[job_idx].get_mut(wi) {
                                    *a = a.min(reduced);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsched_common::{EngineConfig, Graph, NodeId, Workload};

    #[test]
    fn higher_priority_job_processed_first_keeps_its_guarantee() {
        let mut g = Graph::new();
        g.add_edge(NodeId(0), NodeId(1), 100.0);
        let config = EngineConfig::default();
        let mut ctx = TrafficContext::new(&g, &config);

        let job_small_cycle = Job {
            id: JobId(0),
            cycle: 100,
            workloads: vec![Workload {
                src: NodeId(0),
                dst: NodeId(1),
                t_s: 0,
                t_e: 50,
                bw: 60.0,
            }],
        };
        let job_large_cycle = Job {
            id: JobId(1),
            cycle: 10_000,
            workloads: vec![Workload {
                src: NodeId(0),
                dst: NodeId(1),
                t_s: 0,
                t_e: 50,
                bw: 60.0,
            }],
        };
        let sched0 = JobSchedule {
            job_id: JobId(0),
            admit: true,
            start_time: 0,
            tunnels: vec![vec![LinkId(0)]],
            bw_alloc: vec![60.0],
        };
        let sched1 = JobSchedule {
            job_id: JobId(1),
            admit: true,
            start_time: 0,
            tunnels: vec![vec![LinkId(0)]],
            bw_alloc: vec![60.0],
        };

        let mut nc = NcFlow::default();
        let allocs = nc.allocate(
            &mut ctx,
            &[job_small_cycle, job_large_cycle],
            &[sched0, sched1],
        );
        assert!(allocs[0][0] > 0.0);
    }
}
