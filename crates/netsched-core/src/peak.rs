use std::collections::{BTreeSet, HashMap};

use netsched_common::{EngineConfig, JobId, LinkTrafficPattern};

/// Peak aggregate bandwidth on a link, and the time instant (within the
/// superposition cycle) at which it is attained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakBandwidth {
    pub bw: f64,
    pub at: u64,
}

/// Shared periodic-traffic peak-bandwidth engine. Stateless: every call
/// takes the contributing patterns and the jobs' current start offsets as
/// arguments, so Phase 1 and Phase 2 can each own their own per-link
/// tables without this engine retaining anything between calls.
pub struct PeakEngine<'c> {
    config: &'c EngineConfig,
}

impl<'c> PeakEngine<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    fn round_to_precision(value: u64, precision: u64) -> u64 {
        if precision == 0 {
            return value.max(1);
        }
        let rounded = ((value + precision / 2) / precision) * precision;
        rounded.max(precision)
    }

    /// The least common multiple of every distinct (rounded) contributing
    /// cycle, capped at `max_overlap_cycle`.
    pub fn superposition_cycle(&self, patterns: &[LinkTrafficPattern]) -> u64 {
        if patterns.is_empty() {
            return 1;
        }
        let mut cycle: u64 = 1;
        let mut seen = std::collections::HashSet::new();
        for p in patterns {
            let rounded = Self::round_to_precision(p.job_cycle, self.config.cycle_precision);
            if seen.insert(rounded) {
                cycle = num_integer::lcm(cycle, rounded);
                if cycle >= self.config.max_overlap_cycle {
                    cycle = self.config.max_overlap_cycle;
                    break;
                }
            }
        }
        cycle.min(self.config.max_overlap_cycle).max(1)
    }

    /// The set of time instants (modulo the superposition cycle `c`) at
    /// which any contributing pattern starts or ends.
    fn change_points(
        &self,
        patterns: &[LinkTrafficPattern],
        offsets: &HashMap<JobId, u64>,
        c: u64,
    ) -> BTreeSet<u64> {
        let mut points = BTreeSet::new();
        points.insert(0);
        for p in patterns {
            let offset = offsets.get(&p.job_id).copied().unwrap_or(0) % p.job_cycle.max(1);
            let mut m = 0u64;
            while m * p.job_cycle < c {
                let base = m * p.job_cycle;
                points.insert((p.t_s + base + offset) % c);
                points.insert((p.t_e + base + offset) % c);
                m += 1;
            }
        }
        points
    }

    /// Computes the peak aggregate bandwidth over the superposition cycle
    /// derived from `patterns`. Empty pattern lists peak at zero.
    pub fn peak(
        &self,
        patterns: &[LinkTrafficPattern],
        offsets: &HashMap<JobId, u64>,
    ) -> PeakBandwidth {
        if patterns.is_empty() {
            return PeakBandwidth { bw: 0.0, at: 0 };
        }
        let c = self.superposition_cycle(patterns);
        let points = self.change_points(patterns, offsets, c);

        let mut best = PeakBandwidth { bw: 0.0, at: 0 };
        for &t in &points {
            let sum: f64 = patterns
                .iter()
                .filter(|p| {
                    let offset = offsets.get(&p.job_id).copied().unwrap_or(0);
                    p.active_at(t, offset)
                })
                .map(|p| p.bw)
                .sum();
            if sum > best.bw {
                best = PeakBandwidth { bw: sum, at: t };
            }
        }
        best
    }

    /// Peak restricted to instants falling inside `[t_s, t_e)` of the
    /// reference workload (job-local time, ignoring the reference job's
    /// own offset). Used by the Phase-2 "Ours" bottleneck computation.
    pub fn peak_in_window(
        &self,
        patterns: &[LinkTrafficPattern],
        offsets: &HashMap<JobId, u64>,
        window_t_s: u64,
        window_t_e: u64,
        window_cycle: u64,
    ) -> PeakBandwidth {
        if patterns.is_empty() {
            return PeakBandwidth { bw: 0.0, at: window_t_s };
        }
        let c = self.superposition_cycle(patterns).max(window_cycle);
        let points = self.change_points(patterns, offsets, c);

        let mut best = PeakBandwidth {
            bw: 0.0,
            at: window_t_s,
        };
        for &t in &points {
            let local = t % window_cycle;
            if local < window_t_s || local >= window_t_e {
                continue;
            }
            let sum: f64 = patterns
                .iter()
                .filter(|p| {
                    let offset = offsets.get(&p.job_id).copied().unwrap_or(0);
                    p.active_at(t, offset)
                })
                .map(|p| p.bw)
                .sum();
            if sum > best.bw {
                best = PeakBandwidth { bw: sum, at: t };
            }
        }
        best
    }
}
