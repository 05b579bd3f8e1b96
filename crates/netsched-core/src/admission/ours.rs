use std::collections::HashSet;

use netsched_common::{Job, JobId, JobSchedule, LinkId, LinkTrafficPattern};

use crate::pathfinder::PathFinder;

use super::{AdmissionContext, AdmissionStrategy};

/// Direct deployment with a bounded local adjustment fallback: when a
/// job's tunnels don't fit without moving anything, repeatedly find the
/// overflowing link's heaviest contributors and sweep candidate start
/// offsets until every link the job touches fits, or the adjustment
/// budget is exhausted.
#[derive(Default)]
pub struct Ours;

fn tunnel_pattern(job: &Job, wl_idx: usize) -> LinkTrafficPattern {
    let w = &job.workloads[wl_idx];
    LinkTrafficPattern {
        job_id: job.id,
        job_cycle: job.cycle,
        t_s: w.t_s,
        t_e: w.t_e,
        bw: w.bw,
    }
}

fn job_fits(ctx: &AdmissionContext<'_>, job: JobId) -> bool {
    ctx.job_links(job)
        .iter()
        .all(|&l| ctx.peak(l).bw <= ctx.capacity(l) + 1e-9)
}

impl AdmissionStrategy for Ours {
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

        let job_links: Vec<LinkId> = tunnels
            .iter()
            .flatten()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        // Step 1: direct deployment — check without mutating.
        let mut direct_ok = true;
        for (w, tunnel) in job.workloads.iter().zip(&tunnels) {
            for &link in tunnel {
                let peak = ctx.peak(link);
                if ctx.capacity(link) - peak.bw < w.bw - 1e-9 {
                    direct_ok = false;
                    break;
                }
            }
            if !direct_ok {
                break;
            }
        }

        ctx.begin();
        ctx.set_offset(job.id, 0);
        for (i, tunnel) in tunnels.iter().enumerate() {
            let pattern = tunnel_pattern(job, i);
            for &link in tunnel {
                ctx.append_pattern(link, pattern);
            }
        }
        ctx.register_job_links(job.id, job_links.clone());

        if direct_ok {
            let sched = JobSchedule {
                job_id: job.id,
                admit: true,
                start_time: 0,
                tunnels,
                bw_alloc: job.workloads.iter().map(|w| w.bw).collect(),
            };
            ctx.finalize_schedule(sched.clone());
            ctx.commit();
            return sched;
        }

        // Step 2: local adjustment.
        let mut attempts: u32 = 0;
        loop {
            let overflow = job_links
                .iter()
                .copied()
                .find(|&l| ctx.peak(l).bw > ctx.capacity(l) + 1e-9);
            let link = match overflow {
                None => break,
                Some(l) => l,
            };

            attempts += 1;
            if attempts > ctx.config.local_adjust_budget {
                tracing::warn!(
                    job_id = ?job.id,
                    link = ?link,
                    attempts,
                    "local-adjustment budget exhausted, rolling back"
                );
                ctx.rollback();
                return JobSchedule::pending(job.id);
            }
            let peak = ctx.peak(link);
            tracing::debug!(job_id = ?job.id, link = ?link, peak = peak.bw, attempt = attempts, "overflowing link, sweeping contributor offsets");

            let mut contributors: Vec<(JobId, u64, f64)> = ctx
                .patterns(link)
                .iter()
                .filter(|p| p.active_at(peak.at, ctx.offset(p.job_id)))
                .map(|p| (p.job_id, p.job_cycle, p.bw))
                .collect();
            contributors.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap());
            let mut seen_jobs = HashSet::new();
            contributors.retain(|(job_id, ..)| seen_jobs.insert(*job_id));

            let step = ctx.config.time_precision.max(1);
            let mut fixed = false;
            'contrib: for (k_job, k_cycle, _) in contributors {
                let mut s = 0u64;
                while s < k_cycle {
                    let prior = ctx.offset(k_job);
                    ctx.set_offset(k_job, s);
                    let ok =
                        ctx.peak(link).bw <= ctx.capacity(link) + 1e-9 && job_fits(ctx, k_job);
                    tracing::trace!(contributor = ?k_job, candidate_offset = s, accepted = ok, "offset sweep candidate");
                    if ok {
                        fixed = true;
                        break 'contrib;
                    }
                    ctx.set_offset(k_job, prior);
                    s += step;
                }
            }

            if !fixed {
                tracing::warn!(job_id = ?job.id, link = ?link, "no contributor offset fixes the overflow, rolling back");
                ctx.rollback();
                return JobSchedule::pending(job.id);
            }
        }

        let sched = JobSchedule {
            job_id: job.id,
            admit: true,
            start_time: ctx.offset(job.id),
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
    use netsched_common::{EngineConfig, Graph, NodeId, Workload};

    fn two_hop_graph(capacity: f64) -> Graph {
        let mut g = Graph::new();
        g.add_edge(NodeId(0), NodeId(1), capacity);
        g.add_edge(NodeId(1), NodeId(2), capacity);
        g
    }

    fn job(id: u32, cycle: u64, t_s: u64, t_e: u64, bw: f64) -> Job {
        Job {
            id: JobId(id),
            cycle,
            workloads: vec![Workload {
                src: NodeId(0),
                dst: NodeId(2),
                t_s,
                t_e,
                bw,
            }],
        }
    }

    #[test]
    fn single_job_admits_directly() {
        let g = two_hop_graph(100.0);
        let config = EngineConfig::default();
        let mut ctx = AdmissionContext::new(&g, &config);
        let mut ours = Ours;
        let sched = ours.schedule_job(&mut ctx, &job(0, 1000, 0, 500, 40.0));
        assert!(sched.admit);
        assert_eq!(sched.start_time, 0);
        assert_eq!(sched.bw_alloc, vec![40.0]);
    }

    #[test]
    fn second_overlapping_job_shifts_a_contributors_offset_to_fit() {
        let g = two_hop_graph(100.0);
        let config = EngineConfig::default();
        let mut ctx = AdmissionContext::new(&g, &config);
        let mut ours = Ours;
        let s0 = ours.schedule_job(&mut ctx, &job(0, 1000, 0, 500, 60.0));
        assert!(s0.admit);
        let s1 = ours.schedule_job(&mut ctx, &job(1, 1000, 0, 500, 60.0));
        assert!(s1.admit);

        // At least one of the two jobs' start offsets must have moved off
        // zero for both to coexist on a link with only 100 Gbps capacity.
        let final_schedules = ctx.all_schedules();
        let moved = final_schedules.iter().any(|s| s.start_time != 0);
        assert!(moved);
    }

    #[test]
    fn rejects_when_no_path_exists() {
        let mut g = two_hop_graph(100.0);
        g.add_node(NodeId(9));
        let config = EngineConfig::default();
        let mut ctx = AdmissionContext::new(&g, &config);
        let mut ours = Ours;
        let mut j = job(0, 1000, 0, 500, 10.0);
        j.workloads[0].dst = NodeId(9);
        let sched = ours.schedule_job(&mut ctx, &j);
        assert!(!sched.admit);
        assert!(sched.tunnels.is_empty());
    }
}
