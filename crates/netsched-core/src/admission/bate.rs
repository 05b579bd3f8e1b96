use netsched_common::{Job, JobSchedule, LinkTrafficPattern};

use crate::pathfinder::PathFinder;

use super::{AdmissionContext, AdmissionStrategy};

/// Direct deployment only — the baseline variant with no local
/// adjustment. Admission fails as soon as any tunnel link lacks room.
#[derive(Default)]
pub struct Bate;

impl AdmissionStrategy for Bate {
    fn schedule_job(&mut self, ctx: &mut AdmissionContext<'_>, job: &Job) -> JobSchedule {
        let pf = PathFinder::bounded(ctx.graph, ctx.config.max_search_states);
        let mut tunnels = Vec::with_capacity(job.workloads.len());
        for w in &job.workloads {
            let path = pf.find_path(w.src, w.dst);
            if path.is_empty() {
                return JobSchedule::pending(job.id);
            }
            tunnels.push(path);
        }

        for (w, tunnel) in job.workloads.iter().zip(&tunnels) {
            for &link in tunnel {
                let peak = ctx.peak(link);
                if ctx.capacity(link) - peak.bw < w.bw - 1e-9 {
                    return JobSchedule::pending(job.id);
                }
            }
        }

        ctx.begin();
        ctx.set_offset(job.id, 0);
        for (i, tunnel) in tunnels.iter().enumerate() {
            let w = &job.workloads[i];
            let pattern = LinkTrafficPattern {
                job_id: job.id,
                job_cycle: job.cycle,
                t_s: w.t_s,
                t_e: w.t_e,
                bw: w.bw,
            };
            for &link in tunnel {
                ctx.append_pattern(link, pattern);
            }
        }
        let job_links: Vec<_> = tunnels.iter().flatten().copied().collect();
        ctx.register_job_links(job.id, job_links);

        let sched = JobSchedule {
            job_id: job.id,
            admit: true,
            start_time: 0,
            tunnels,
            bw_alloc: job.workloads.iter().map(|w| w.bw).collect(),
        };
        ctx.finalize_schedule(sched.clone());
        ctx.commit();
        sched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsched_common::{EngineConfig, Graph, JobId, NodeId, Workload};

    fn two_hop_graph(capacity: f64) -> Graph {
        let mut g = Graph::new();
        g.add_edge(NodeId(0), NodeId(1), capacity);
        g.add_edge(NodeId(1), NodeId(2), capacity);
        g
    }

    fn job(id: u32, bw: f64) -> Job {
        Job {
            id: JobId(id),
            cycle: 1000,
            workloads: vec![Workload {
                src: NodeId(0),
                dst: NodeId(2),
                t_s: 0,
                t_e: 500,
                bw,
            }],
        }
    }

    #[test]
    fn admits_when_capacity_allows_both() {
        let g = two_hop_graph(100.0);
        let config = EngineConfig::default();
        let mut ctx = AdmissionContext::new(&g, &config);
        let mut bate = Bate;
        assert!(bate.schedule_job(&mut ctx, &job(0, 40.0)).admit);
        assert!(bate.schedule_job(&mut ctx, &job(1, 40.0)).admit);
    }

    #[test]
    fn rejects_the_second_job_without_trying_to_adjust() {
        let g = two_hop_graph(100.0);
        let config = EngineConfig::default();
        let mut ctx = AdmissionContext::new(&g, &config);
        let mut bate = Bate;
        assert!(bate.schedule_job(&mut ctx, &job(0, 60.0)).admit);
        let s1 = bate.schedule_job(&mut ctx, &job(1, 60.0));
        assert!(!s1.admit);
    }
}
