//! Phase-1 admission control: direct deployment plus, for some variants, a
//! bounded local adjustment that reassigns heavy contributors' start
//! offsets. All four variants share [`AdmissionContext`] — the per-link
//! traffic/offset tables — and differ only in path selection and the
//! admission test applied once a tunnel is chosen.

pub mod aequitas;
pub mod bate;
pub mod ours;
pub mod seawall;

use std::collections::HashMap;

use netsched_common::{EngineConfig, Graph, JobId, JobSchedule, LinkId, LinkTrafficPattern};

use crate::peak::{PeakBandwidth, PeakEngine};

/// Capability interface implemented by every Phase-1 variant. `main`/the
/// CLI selects one implementation by name at startup.
pub trait AdmissionStrategy {
    fn schedule_job(
        &mut self,
        ctx: &mut AdmissionContext<'_>,
        job: &netsched_common::Job,
    ) -> netsched_common::JobSchedule;
}

/// A single undo step recorded while tentatively mutating per-link state.
/// Reverting a journal pops these in reverse (LIFO) order, matching commit
/// order exactly.
enum JournalEntry {
    AppendedPattern(LinkId),
    Offset(JobId, Option<u64>),
    JobLinks(JobId, Option<Vec<LinkId>>),
    Schedule(JobId, Option<JobSchedule>),
}

/// Owns the per-link traffic-pattern lists and per-job start offsets that
/// Phase 1 builds up as jobs are admitted. Shared by all four admission
/// variants; each variant's `schedule_job` mutates it through the
/// journalled helpers below so any failed attempt can be rolled back
/// byte-for-byte.
pub struct AdmissionContext<'a> {
    pub graph: &'a Graph,
    pub config: &'a EngineConfig,
    patterns: HashMap<LinkId, Vec<LinkTrafficPattern>>,
    offsets: HashMap<JobId, u64>,
    job_links: HashMap<JobId, Vec<LinkId>>,
    schedules: HashMap<JobId, JobSchedule>,
    /// Job ids in the order their schedules were first finalized — the
    /// deterministic emission order, independent of `HashMap` iteration.
    order: Vec<JobId>,
    journal: Vec<JournalEntry>,
}

impl<'a> AdmissionContext<'a> {
    pub fn new(graph: &'a Graph, config: &'a EngineConfig) -> Self {
        Self {
            graph,
            config,
            patterns: HashMap::new(),
            offsets: HashMap::new(),
            job_links: HashMap::new(),
            schedules: HashMap::new(),
            order: Vec::new(),
            journal: Vec::new(),
        }
    }

    pub fn capacity(&self, link: LinkId) -> f64 {
        self.graph.link(link).map(|l| l.capacity).unwrap_or(0.0)
    }

    pub fn patterns(&self, link: LinkId) -> &[LinkTrafficPattern] {
        self.patterns
            .get(&link)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn offset(&self, job: JobId) -> u64 {
        self.offsets.get(&job).copied().unwrap_or(0)
    }

    pub fn peak(&self, link: LinkId) -> PeakBandwidth {
        PeakEngine::new(self.config).peak(self.patterns(link), &self.offsets)
    }

    pub fn peak_in_window(
        &self,
        link: LinkId,
        window_t_s: u64,
        window_t_e: u64,
        window_cycle: u64,
    ) -> PeakBandwidth {
        PeakEngine::new(self.config).peak_in_window(
            self.patterns(link),
            &self.offsets,
            window_t_s,
            window_t_e,
            window_cycle,
        )
    }

    /// Starts a new journal. All mutations after this call can be undone
    /// in one shot with [`Self::rollback`], or kept with [`Self::commit`].
    pub fn begin(&mut self) {
        self.journal.clear();
    }

    pub fn append_pattern(&mut self, link: LinkId, pattern: LinkTrafficPattern) {
        self.patterns.entry(link).or_default().push(pattern);
        self.journal.push(JournalEntry::AppendedPattern(link));
    }

    /// Sets a job's start offset. If the job already has a finalized
    /// schedule (it was admitted by an earlier call), that schedule's
    /// `start_time` is kept in sync — otherwise a local adjustment that
    /// reassigns an already-admitted job's offset would leave its
    /// previously emitted schedule stale.
    pub fn set_offset(&mut self, job: JobId, offset: u64) {
        let prior = self.offsets.insert(job, offset);
        self.journal.push(JournalEntry::Offset(job, prior));
        if let Some(existing) = self.schedules.get(&job) {
            if existing.start_time != offset {
                let mut updated = existing.clone();
                updated.start_time = offset;
                let old = self.schedules.insert(job, updated);
                self.journal.push(JournalEntry::Schedule(job, old));
            }
        }
    }

    /// Records `schedule` as the finalized outcome for its job, called by
    /// a variant right before [`Self::commit`]. Later [`Self::set_offset`]
    /// calls against the same job (from a future job's local adjustment)
    /// keep this record's `start_time` current.
    pub fn finalize_schedule(&mut self, schedule: JobSchedule) {
        let job = schedule.job_id;
        if !self.schedules.contains_key(&job) {
            self.order.push(job);
        }
        let old = self.schedules.insert(job, schedule);
        self.journal.push(JournalEntry::Schedule(job, old));
    }

    /// All finalized schedules, in the order they were first admitted.
    pub fn all_schedules(&self) -> Vec<JobSchedule> {
        self.order
            .iter()
            .filter_map(|j| self.schedules.get(j).cloned())
            .collect()
    }

    /// Records the set of links a job's tunnels touch, so a later local
    /// adjustment of another job can check "none of job k's other links
    /// overflow" without re-deriving its tunnels.
    pub fn register_job_links(&mut self, job: JobId, links: Vec<LinkId>) {
        let prior = self.job_links.insert(job, links);
        self.journal.push(JournalEntry::JobLinks(job, prior));
    }

    pub fn job_links(&self, job: JobId) -> &[LinkId] {
        self.job_links.get(&job).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Reverts every mutation recorded since the last [`Self::begin`], in
    /// LIFO order — matching commit order exactly, per the rollback
    /// invariant.
    pub fn rollback(&mut self) {
        while let Some(entry) = self.journal.pop() {
            match entry {
                JournalEntry::AppendedPattern(link) => {
                    if let Some(list) = self.patterns.get_mut(&link) {
                        list.pop();
                    }
                }
                JournalEntry::Offset(job, prior) => match prior {
                    Some(v) => {
                        self.offsets.insert(job, v);
                    }
                    None => {
                        self.offsets.remove(&job);
                    }
                },
                JournalEntry::JobLinks(job, prior) => match prior {
                    Some(v) => {
                        self.job_links.insert(job, v);
                    }
                    None => {
                        self.job_links.remove(&job);
                    }
                },
                JournalEntry::Schedule(job, prior) => match prior {
                    Some(v) => {
                        self.schedules.insert(job, v);
                    }
                    None => {
                        self.schedules.remove(&job);
                    }
                },
            }
        }
    }

    /// Discards the journal without undoing anything — the attempt
    /// succeeded.
    pub fn commit(&mut self) {
        self.journal.clear();
    }
}
