use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT::NonnegativeConeT,
};
use netsched_common::{Job, JobSchedule};

use super::{tunnel_bottleneck_in_window, TrafficContext, TrafficEngineer};

/// Per-job small LP: maximise `Σ f_i` subject to `f_i ≤ bottleneck_i`
/// (bottleneck computed over each workload's own active window) and `f_i
/// ≤ demand_i`. Jobs are processed independently, in the order they were
/// admitted — no cross-job coupling in this formulation. Falls back to
/// `Greedy`'s closed-form `min(demand, bottleneck)` allocation, computed
/// inline, for any job whose LP the solver reports infeasible.
#[derive(Default)]
pub struct LpOurs;

fn solve_job(bottlenecks: &[f64], demands: &[f64]) -> Option<Vec<f64>> {
    let n = bottlenecks.len();
    if n == 0 {
        return Some(Vec::new());
    }
    let p = CscMatrix::zeros((n, n));
    let q = vec![-1.0; n];

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(3 * n);
    let mut b: Vec<f64> = Vec::with_capacity(3 * n);
    for i in 0..n {
        let mut row = vec![0.0; n];
        row[i] = 1.0;
        rows.push(row);
        b.push(bottlenecks[i].max(0.0));
    }
    for i in 0..n {
        let mut row = vec![0.0; n];
        row[i] = 1.0;
        rows.push(row);
        b.push(demands[i].max(0.0));
    }
    for i in 0..n {
        let mut row = vec![0.0; n];
        row[i] = -1.0;
        rows.push(row);
        b.push(0.0);
    }
    let a = CscMatrix::from(&rows);
    let cones = vec![NonnegativeConeT(rows.len())];
    let settings = DefaultSettingsBuilder::default()
        .verbose(false)
        .build()
        .ok()?;
    let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
    solver.solve();

    match solver.solution.status {
        SolverStatus::Solved => Some(solver.solution.x.clone()),
        _ => None,
    }
}

impl TrafficEngineer for LpOurs {
    fn allocate(
        &mut self,
        ctx: &mut TrafficContext<'_>,
        jobs: &[Job],
        schedules: &[JobSchedule],
    ) -> Vec<Vec<f64>> {
        let mut results = Vec::with_capacity(jobs.len());
        for (job, sched) in jobs.iter().zip(schedules) {
            ctx.set_offset(job.id, sched.start_time);

            let bottlenecks: Vec<f64> = job
                .workloads
                .iter()
                .zip(&sched.tunnels)
                .map(|(w, tunnel)| {
                    tunnel_bottleneck_in_window(ctx, tunnel, w.t_s, w.t_e, job.cycle)
                })
                .collect();
            let demands: Vec<f64> = job.workloads.iter().map(|w| w.bw).collect();

            let allocs = match solve_job(&bottlenecks, &demands) {
                Some(x) => x
                    .into_iter()
                    .zip(&demands)
                    .map(|(f, &d)| f.clamp(0.0, d))
                    .collect(),
                None => {
                    tracing::warn!(job_id = ?job.id, "LP infeasible, falling back to greedy");
                    bottlenecks
                        .iter()
                        .zip(&demands)
                        .map(|(&bn, &d)| d.min(bn.max(0.0)))
                        .collect::<Vec<_>>()
                }
            };

            for ((w, tunnel), &bw) in job.workloads.iter().zip(&sched.tunnels).zip(&allocs) {
                ctx.commit_allocation(job.id, job.cycle, w.t_s, w.t_e, bw, tunnel);
            }
            results.push(allocs);
        }
        results
    }
}
