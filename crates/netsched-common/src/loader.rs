use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::config::EngineConfig;
use crate::error::{NetSchedError, Result};
use crate::graph::Graph;
use crate::ids::{JobId, NodeId};
use crate::workload::{Job, Workload};

/// One row of the tabular topology input. `delay` and `node_type` are
/// accepted but not required by the core — undirected topologies are
/// expressed as two rows, one per direction.
#[derive(Debug, Deserialize)]
struct TopologyRecord {
    a_node_id: u32,
    z_node_id: u32,
    capacity: f64,
    #[serde(default)]
    #[allow(dead_code)]
    delay: Option<f64>,
    #[serde(default)]
    #[allow(dead_code)]
    node_type: Option<String>,
}

/// Builds a [`Graph`] from a CSV reader, one directed link per row.
pub fn load_topology<R: Read>(reader: R) -> Result<Graph> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut graph = Graph::new();
    for result in rdr.deserialize() {
        let record: TopologyRecord = result?;
        if record.capacity < 0.0 {
            return Err(NetSchedError::InvalidInput(format!(
                "negative capacity on link {}->{}",
                record.a_node_id, record.z_node_id
            )));
        }
        graph.add_edge(
            NodeId(record.a_node_id),
            NodeId(record.z_node_id),
            record.capacity,
        );
    }
    Ok(graph)
}

pub fn load_topology_file(path: impl AsRef<Path>) -> Result<Graph> {
    let file = std::fs::File::open(path)?;
    load_topology(file)
}

/// One structured demand within a job record, as received in milliseconds.
#[derive(Debug, Deserialize)]
struct DemandRecord {
    src_rank: u32,
    dst_rank: u32,
    start_timestamp: u64,
    end_timestamp: u64,
    bandwidth: f64,
}

#[derive(Debug, Deserialize)]
struct JobRecord {
    job_id: u32,
    #[serde(rename = "cycle")]
    cycle_ms: u64,
    #[serde(alias = "workloads")]
    demands: Vec<DemandRecord>,
}

/// Parses a JSON array of job records, converting millisecond fields to
/// epochs per `config` (start floors, end ceilings, cycle ceilings).
pub fn load_jobs<R: Read>(reader: R, config: &EngineConfig) -> Result<Vec<Job>> {
    let records: Vec<JobRecord> = serde_json::from_reader(reader)?;
    let mut jobs = Vec::with_capacity(records.len());
    for record in records {
        let cycle = config.ms_to_epoch_ceil(record.cycle_ms);
        let mut workloads = Vec::with_capacity(record.demands.len());
        for d in record.demands {
            let t_s = config.ms_to_epoch_floor(d.start_timestamp);
            let t_e = config.ms_to_epoch_ceil(d.end_timestamp);
            if t_s >= t_e || t_e > cycle {
                return Err(NetSchedError::InvalidInput(format!(
                    "job {}: workload window [{t_s}, {t_e}) invalid for cycle {cycle}",
                    record.job_id
                )));
            }
            workloads.push(Workload {
                src: NodeId(d.src_rank),
                dst: NodeId(d.dst_rank),
                t_s,
                t_e,
                bw: d.bandwidth,
            });
        }
        jobs.push(Job {
            id: JobId(record.job_id),
            cycle,
            workloads,
        });
    }
    Ok(jobs)
}

pub fn load_jobs_file(path: impl AsRef<Path>, config: &EngineConfig) -> Result<Vec<Job>> {
    let file = std::fs::File::open(path)?;
    load_jobs(file, config)
}
