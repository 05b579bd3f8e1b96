use std::collections::HashMap;

use netsched_common::{Job, JobSchedule, LinkId, LinkTrafficPattern};

use crate::pathfinder::PathFinder;

use super::{AdmissionContext, AdmissionStrategy};

const CANDIDATE_PATHS: usize = 3;

/// Bandwidth-proportional fair-share admission: every job gets a quota
/// equal to the sum of its declared workload demands. Among candidate
/// paths, the one maximising `Σ capacity(ℓ)·quota/(link_quota_sum(ℓ) +
/// quota)` is preferred — links already carrying large-quota jobs give
/// smaller newcomers less of their capacity share. The hard admission gate
/// is still peak ≤ capacity, shared with every other variant.
#[derive(Default)]
pub struct Seawall {
    link_quota_sum: HashMap<LinkId, f64>,
}

impl Seawall {
    fn score_path(&self, ctx: &AdmissionContext<'_>, path: &[LinkId], quota: f64) -> f64 {
        path.iter()
            .map(|&l| {
                let capacity = ctx.capacity(l);
                let existing = self.link_quota_sum.get(&l).copied().unwrap_or(0.0);
                capacity * quota / (existing + quota).max(1e-9)
            })
            .sum()
    }
}

impl AdmissionStrategy for Seawall {
    fn schedule_job(&mut self, ctx: &mut AdmissionContext<'_>, job: &Job) -> JobSchedule {
        let quota: f64 = job.workloads.iter().map(|w| w.bw).sum();

        let pf = PathFinder::bounded(ctx.graph, ctx.config.max_search_states);
        let mut tunnels = Vec::with_capacity(job.workloads.len());
        for w in &job.workloads {
            let candidates = pf.find_multi_path(w.src, w.dst, CANDIDATE_PATHS);
            let best = candidates.into_iter().max_by(|a, b| {
                self.score_path(ctx, a, quota)
                    .partial_cmp(&self.score_path(ctx, b, quota))
                    .unwrap()
            });
            match best {
                Some(path) if !path.is_empty() => tunnels.push(path),
                _ => return JobSchedule::pending(job.id),
            }
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
                *self.link_quota_sum.entry(link).or_insert(0.0) += quota;
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
