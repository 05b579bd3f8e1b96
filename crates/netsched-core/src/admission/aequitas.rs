use std::collections::HashMap;

use netsched_common::{Job, JobSchedule, LinkId, LinkTrafficPattern};

use crate::pathfinder::PathFinder;

use super::{AdmissionContext, AdmissionStrategy};

const CANDIDATE_PATHS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriorityClass {
    Pc,
    Nc,
    Be,
}

/// Priority-weighted admission: every job is assigned a class (PC/NC/BE,
/// weights 8/4/1) by its position in the arrival sequence. Path selection
/// maximises the product of each link's running admission probability
/// `Π(1 − weighted_bw/capacity)`, where `weighted_bw = bw / class_weight` —
/// a PC job's demand counts for an eighth of what the same demand would
/// count for a BE job, so high-priority jobs see more apparent headroom and
/// gravitate to the least-loaded paths first. The final admission test is
/// still the hard peak ≤ capacity check shared with every other variant —
/// the probability product only ranks candidate paths.
pub struct Aequitas {
    job_index: u32,
    link_admit_prob: HashMap<LinkId, f64>,
}

impl Default for Aequitas {
    fn default() -> Self {
        Self {
            job_index: 0,
            link_admit_prob: HashMap::new(),
        }
    }
}

impl Aequitas {
    fn classify(&self) -> PriorityClass {
        match self.job_index % 3 {
            0 => PriorityClass::Pc,
            1 => PriorityClass::Nc,
            _ => PriorityClass::Be,
        }
    }

    fn weight_for(ctx: &AdmissionContext<'_>, class: PriorityClass) -> f64 {
        (match class {
            PriorityClass::Pc => ctx.config.aequitas_pc_weight,
            PriorityClass::Nc => ctx.config.aequitas_nc_weight,
            PriorityClass::Be => ctx.config.aequitas_be_weight,
        }) as f64
    }

    fn admit_prob(&self, link: LinkId) -> f64 {
        self.link_admit_prob.get(&link).copied().unwrap_or(1.0)
    }

    /// `weight` discounts how heavily this job's own bandwidth counts
    /// against a link's running admission probability: a PC job (weight 8)
    /// perceives a link as an eighth as loaded as an BE job (weight 1)
    /// would, so higher-priority jobs gravitate toward the least-loaded
    /// paths first.
    fn score_path(&self, ctx: &AdmissionContext<'_>, path: &[LinkId], bw: f64, weight: f64) -> f64 {
        path.iter()
            .map(|&l| {
                let capacity = ctx.capacity(l).max(1e-9);
                let weighted_bw = (bw / weight).min(capacity);
                self.admit_prob(l) * (1.0 - (weighted_bw / capacity).min(1.0))
            })
            .product()
    }
}

impl AdmissionStrategy for Aequitas {
    fn schedule_job(&mut self, ctx: &mut AdmissionContext<'_>, job: &Job) -> JobSchedule {
        let class = self.classify();
        let weight = Self::weight_for(ctx, class);
        self.job_index += 1;

        let pf = PathFinder::bounded(ctx.graph, ctx.config.max_search_states);
        let mut tunnels = Vec::with_capacity(job.workloads.len());
        for w in &job.workloads {
            let candidates = pf.find_multi_path(w.src, w.dst, CANDIDATE_PATHS);
            let best = candidates
                .into_iter()
                .max_by(|a, b| {
                    self.score_path(ctx, a, w.bw, weight)
                        .partial_cmp(&self.score_path(ctx, b, w.bw, weight))
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
        let mut prob_journal: Vec<(LinkId, f64)> = Vec::new();
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
                let capacity = ctx.capacity(link).max(1e-9);
                let prior = self.admit_prob(link);
                prob_journal.push((link, prior));
                let weighted_bw = (w.bw / weight).min(capacity);
                self.link_admit_prob
                    .insert(link, prior * (1.0 - (weighted_bw / capacity).min(1.0)));
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
        let _ = prob_journal; // committed: no rollback needed.
        sched
    }
}
