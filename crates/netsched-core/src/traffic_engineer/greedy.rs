use netsched_common::{Job, JobSchedule};

use super::{tunnel_bottleneck_in_window, TrafficContext, TrafficEngineer};

/// Closed-form allocation: each workload gets `min(demand, bottleneck)`,
/// where bottleneck is the minimum residual capacity across its tunnel's
/// links, restricted to the workload's own active window. Jobs and
/// workloads are processed in order, updating peaks incrementally after
/// each workload, so two non-overlapping workloads on the same tunnel
/// never compete for each other's share of capacity.
#[derive(Default)]
pub struct Greedy;

impl TrafficEngineer for Greedy {
    fn allocate(
        &mut self,
        ctx: &mut TrafficContext<'_>,
        jobs: &[Job],
        schedules: &[JobSchedule],
    ) -> Vec<Vec<f64>> {
        let mut results = Vec::with_capacity(jobs.len());
        for (job, sched) in jobs.iter().zip(schedules) {
            ctx.set_offset(job.id, sched.start_time);
            let mut allocs = Vec::with_capacity(job.workloads.len());
            for (w, tunnel) in job.workloads.iter().zip(&sched.tunnels) {
                let bottleneck =
                    tunnel_bottleneck_in_window(ctx, tunnel, w.t_s, w.t_e, job.cycle);
                let bw = w.bw.min(bottleneck).max(0.0);
                ctx.commit_allocation(job.id, job.cycle, w.t_s, w.t_e, bw, tunnel);
                allocs.push(bw);
            }
            results.push(allocs);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsched_common::{EngineConfig, Graph, JobId, LinkId, NodeId, Workload};

    fn two_hop_graph(capacity: f64) -> Graph {
        let mut g = Graph::new();
        g.add_edge(NodeId(0), NodeId(1), capacity);
        g.add_edge(NodeId(1), NodeId(2), capacity);
        g
    }

    #[test]
    fn allocates_full_demand_when_capacity_allows() {
        let g = two_hop_graph(100.0);
        let config = EngineConfig::default();
        let mut ctx = TrafficContext::new(&g, &config);
        let job = Job {
            id: JobId(0),
            cycle: 1000,
            workloads: vec![Workload {
                src: NodeId(0),
                dst: NodeId(2),
                t_s: 0,
                t_e: 500,
                bw: 40.0,
            }],
        };
        let sched = JobSchedule {
            job_id: JobId(0),
            admit: true,
            start_time: 0,
            tunnels: vec![vec![LinkId(0), LinkId(1)]],
            bw_alloc: vec![40.0],
        };
        let mut greedy = Greedy;
        let allocs = greedy.allocate(&mut ctx, &[job], &[sched]);
        assert_eq!(allocs, vec![vec![40.0]]);
    }

    #[test]
    fn caps_second_job_at_residual_capacity() {
        let g = two_hop_graph(100.0);
        let config = EngineConfig::default();
        let mut ctx = TrafficContext::new(&g, &config);
        let tunnel = vec![LinkId(0), LinkId(1)];
        let job0 = Job {
            id: JobId(0),
            cycle: 1000,
            workloads: vec![Workload {
                src: NodeId(0),
                dst: NodeId(2),
                t_s: 0,
                t_e: 500,
                bw: 40.0,
            }],
        };
        let job1 = Job {
            id: JobId(1),
            cycle: 1000,
            workloads: vec![Workload {
                src: NodeId(0),
                dst: NodeId(2),
                t_s: 0,
                t_e: 500,
                bw: 80.0,
            }],
        };
        let sched0 = JobSchedule {
            job_id: JobId(0),
            admit: true,
            start_time: 0,
            tunnels: vec![tunnel.clone()],
            bw_alloc: vec![40.0],
        };
        let sched1 = JobSchedule {
            job_id: JobId(1),
            admit: true,
            start_time: 0,
            tunnels: vec![tunnel],
            bw_alloc: vec![80.0],
        };
        let mut greedy = Greedy;
        let allocs = greedy.allocate(&mut ctx, &[job0, job1], &[sched0, sched1]);
        assert_eq!(allocs[0], vec![40.0]);
        assert_eq!(allocs[1], vec![60.0]);
    }
}
