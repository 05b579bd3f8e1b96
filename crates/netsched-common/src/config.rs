/// Every tunable named in the peak-bandwidth engine and the admission/TE
/// variants lives here. Constructed once at startup and threaded through
/// every component — nothing in this crate or `netsched-core` reads a
/// process-wide static for these values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Discretisation unit for all times, in milliseconds.
    pub epoch_ms: u64,
    /// Rounding granularity applied to each job's cycle before the
    /// superposition cycle's LCM reduction.
    pub cycle_precision: u64,
    /// Step size (epochs) used when sweeping candidate start offsets during
    /// local adjustment.
    pub time_precision: u64,
    /// Hard cap on the superposition cycle `C` used by the peak-bandwidth
    /// engine. Bounds peak-evaluation work at the cost of accuracy when
    /// contributing cycles are pairwise coprime and their true LCM would be
    /// far larger.
    pub max_overlap_cycle: u64,
    /// Maximum number of link-adjust calls spent on a single job during
    /// local adjustment before giving up and rolling back.
    pub local_adjust_budget: u32,
    /// Maximum search states spent inside a single bounded path search
    /// (`PathFinder::bounded`) before returning whatever results were
    /// already collected.
    pub max_search_states: usize,

    // IGR-specific tunables (see `netsched_core::traffic_engineer::igr`).
    pub igr_table_size: u32,
    pub igr_min_paths_per_group: usize,
    pub igr_max_weight: u32,
    pub igr_oversub_increment: f64,
    pub igr_min_ecmp_size: usize,
    pub igr_spread_factor: f64,
    pub igr_max_oversub_factor: f64,

    // NCFlow-specific tunables.
    pub ncflow_cleanup_utilization_threshold: f64,

    // Aequitas priority weights.
    pub aequitas_pc_weight: u32,
    pub aequitas_nc_weight: u32,
    pub aequitas_be_weight: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epoch_ms: 10,
            cycle_precision: 100,
            time_precision: 100,
            max_overlap_cycle: 10_000,
            local_adjust_budget: 10,
            max_search_states: 10_000,

            igr_table_size: 4096,
            igr_min_paths_per_group: 2,
            igr_max_weight: 200,
            igr_oversub_increment: 0.1,
            igr_min_ecmp_size: 4,
            igr_spread_factor: 0.7,
            igr_max_oversub_factor: 8.0,

            ncflow_cleanup_utilization_threshold: 0.95,

            aequitas_pc_weight: 8,
            aequitas_nc_weight: 4,
            aequitas_be_weight: 1,
        }
    }
}

impl EngineConfig {
    /// Converts a millisecond duration into epochs, flooring.
    pub fn ms_to_epoch_floor(&self, ms: u64) -> u64 {
        ms / self.epoch_ms
    }

    /// Converts a millisecond duration into epochs, ceiling.
    pub fn ms_to_epoch_ceil(&self, ms: u64) -> u64 {
        ms.div_ceil(self.epoch_ms)
    }
}
