//! NetSched command-line driver.
//!
//! Wires the topology/job loaders to the selected Phase-1 admission
//! strategy and (optionally) Phase-2 traffic-engineering variant, then
//! writes the resulting schedule artefact to disk.
//!
//! ## Usage
//!
//! ```bash
//! # Phase 1 only: admission decisions and tunnels
//! netsched --topology topo.csv --jobs jobs.json --phase1 ours --out schedule.json
//!
//! # Phase 1 + Phase 2: also allocate carried bandwidth
//! netsched --topology topo.csv --jobs jobs.json --phase1 ours --phase2 ncflow --out schedule.json
//! ```

use std::fs::File;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use netsched_common::{loader, EngineConfig, JobSchedule};
use netsched_core::admission::{aequitas::Aequitas, bate::Bate, ours::Ours, seawall::Seawall};
use netsched_core::traffic_engineer::{
    greedy::Greedy, igr::Igr, lp::LpOurs, ncflow::NcFlow, TrafficContext, TrafficEngineer,
};
use netsched_core::{emitter, AdmissionContext, AdmissionStrategy};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// First-come, first-served: jobs are scheduled in input order.
    Fcfs,
    /// Shortest-job-first: jobs are scheduled in ascending total-bandwidth order.
    Sjf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Phase1Strategy {
    Ours,
    Bate,
    Aequitas,
    Seawall,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Phase2Strategy {
    Ours,
    Greedy,
    Ncflow,
    Igr,
}

/// NetSched: periodic-traffic admission control and bandwidth allocation.
#[derive(Parser, Debug)]
#[command(name = "netsched", about = "Periodic-traffic admission control and traffic engineering")]
struct Cli {
    /// Topology CSV (a_node_id,z_node_id,capacity[,delay,node_type]).
    #[arg(long)]
    topology: PathBuf,

    /// Job set JSON.
    #[arg(long)]
    jobs: PathBuf,

    /// Scheduling order applied before admission.
    #[arg(long, value_enum, default_value_t = Scenario::Fcfs)]
    scenario: Scenario,

    /// Phase-1 admission-control strategy.
    #[arg(long = "phase1", value_enum, default_value_t = Phase1Strategy::Ours)]
    phase1: Phase1Strategy,

    /// Phase-2 traffic-engineering strategy. Omit to skip Phase 2 and emit
    /// admission-only schedules (demand-equal allocations for admitted jobs).
    #[arg(long = "phase2", value_enum)]
    phase2: Option<Phase2Strategy>,

    /// Output path for the schedule artefact (JSON).
    #[arg(long = "out", default_value = "schedule.json")]
    out: PathBuf,

    /// Output path for the per-job result-emitter report (JSON): status,
    /// start time, and per-demand path/bandwidth records.
    #[arg(long = "report-out", default_value = "report.json")]
    report_out: PathBuf,

    /// Output path for the per-link utilisation report (one `peak/capacity`
    /// value per line, over every link in the topology). Only written when
    /// `--phase2` ran.
    #[arg(long = "utilization-out", default_value = "utilization.txt")]
    utilization_out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .compact()
        .init();

    let cli = Cli::parse();
    tracing::info!(
        topology = ?cli.topology,
        jobs = ?cli.jobs,
        phase1 = ?cli.phase1,
        phase2 = ?cli.phase2,
        "netsched starting"
    );

    let config = EngineConfig::default();

    let graph = loader::load_topology_file(&cli.topology)
        .map_err(|e| anyhow::anyhow!("failed to load topology {:?}: {e}", cli.topology))?;
    let mut jobs = loader::load_jobs_file(&cli.jobs, &config)
        .map_err(|e| anyhow::anyhow!("failed to load jobs {:?}: {e}", cli.jobs))?;

    match cli.scenario {
        Scenario::Fcfs => {}
        Scenario::Sjf => jobs.sort_by(|a, b| {
            a.total_bandwidth()
                .partial_cmp(&b.total_bandwidth())
                .unwrap()
        }),
    }

    let mut admission_ctx = AdmissionContext::new(&graph, &config);
    let mut strategy: Box<dyn AdmissionStrategy> = match cli.phase1 {
        Phase1Strategy::Ours => Box::new(Ours),
        Phase1Strategy::Bate => Box::new(Bate),
        Phase1Strategy::Aequitas => Box::new(Aequitas::default()),
        Phase1Strategy::Seawall => Box::new(Seawall::default()),
    };
    let mut schedules = Vec::with_capacity(jobs.len());
    for job in &jobs {
        let sched = strategy.schedule_job(&mut admission_ctx, job);
        if sched.admit {
            tracing::info!(job_id = ?job.id, start_time = sched.start_time, "job admitted");
        } else {
            tracing::warn!(job_id = ?job.id, "job rejected");
        }
        schedules.push(sched);
    }
    // Local adjustment in a later call can move an already-admitted job's
    // offset; the context's finalized record is the source of truth for
    // admitted jobs, so merge it back over the per-call return values.
    let current = admission_ctx.all_schedules();
    let schedules: Vec<JobSchedule> = schedules
        .into_iter()
        .map(|s| {
            current
                .iter()
                .find(|c| c.job_id == s.job_id)
                .cloned()
                .unwrap_or(s)
        })
        .collect();

    let report = emitter::AdmissionReport::from_schedules(&schedules);
    tracing::info!(admitted = report.admitted, total = report.total, ratio = report.ratio, "admission complete");

    let admitted_jobs: Vec<_> = jobs
        .iter()
        .zip(&schedules)
        .filter(|(_, s)| s.admit)
        .map(|(j, _)| j.clone())
        .collect();
    let admitted_schedules: Vec<_> = schedules.iter().filter(|s| s.admit).cloned().collect();

    let final_schedules = if let Some(phase2) = cli.phase2 {
        let mut traffic_ctx = TrafficContext::new(&graph, &config);
        let allocs = match phase2 {
            Phase2Strategy::Ours => {
                LpOurs.allocate(&mut traffic_ctx, &admitted_jobs, &admitted_schedules)
            }
            Phase2Strategy::Greedy => {
                Greedy.allocate(&mut traffic_ctx, &admitted_jobs, &admitted_schedules)
            }
            Phase2Strategy::Ncflow => {
                NcFlow::default().allocate(&mut traffic_ctx, &admitted_jobs, &admitted_schedules)
            }
            Phase2Strategy::Igr => {
                Igr.allocate(&mut traffic_ctx, &admitted_jobs, &admitted_schedules)
            }
        };

        let mut merged = schedules.clone();
        for (sched, job_allocs) in admitted_schedules.iter().zip(&allocs) {
            if let Some(out) = merged.iter_mut().find(|s| s.job_id == sched.job_id) {
                out.bw_alloc = job_allocs.clone();
            }
        }

        let utilization = emitter::full_link_utilization_report(&graph, &traffic_ctx);
        write_utilization(&cli.utilization_out, &utilization)?;
        tracing::info!(out = ?cli.utilization_out, links = utilization.len(), "link utilisation report written");

        merged
    } else {
        schedules
    };

    write_schedule(&cli.out, &final_schedules)?;
    tracing::info!(out = ?cli.out, "schedule written");

    let records = emitter::job_records(&final_schedules);
    let report_file = File::create(&cli.report_out)
        .map_err(|e| anyhow::anyhow!("failed to create output file {:?}: {e}", cli.report_out))?;
    serde_json::to_writer_pretty(report_file, &records)?;
    tracing::info!(out = ?cli.report_out, "result-emitter report written");

    Ok(())
}

fn write_schedule(path: &PathBuf, schedules: &[JobSchedule]) -> anyhow::Result<()> {
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("failed to create output file {:?}: {e}", path))?;
    serde_json::to_writer_pretty(file, schedules)?;
    Ok(())
}

/// Writes one `peak/capacity` value per line, in link-id order — the
/// newline-separated stream §6 describes for downstream plotting.
fn write_utilization(
    path: &PathBuf,
    utilization: &[(netsched_common::LinkId, f64)],
) -> anyhow::Result<()> {
    use std::io::Write;
    let mut sorted = utilization.to_vec();
    sorted.sort_by_key(|(l, _)| l.0);
    let mut file = File::create(path)
        .map_err(|e| anyhow::anyhow!("failed to create output file {:?}: {e}", path))?;
    for (_, util) in sorted {
        writeln!(file, "{util}")?;
    }
    Ok(())
}
