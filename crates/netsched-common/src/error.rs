use thiserror::Error;

use crate::ids::{LinkId, NodeId};

/// Error taxonomy shared by every admission-control and traffic-engineering
/// variant. Each variant maps directly to a Phase-1/Phase-2 outcome — see
/// the call sites in `netsched-core` for the recovery policy attached to
/// each one.
#[derive(Debug, Error)]
pub enum NetSchedError {
    #[error("no path from node {src} to node {dst}")]
    NoPath { src: NodeId, dst: NodeId },

    #[error("insufficient capacity on link {link}: requested {requested}, available {available}")]
    InsufficientCapacity {
        link: LinkId,
        requested: f64,
        available: f64,
    },

    #[error("budget exhausted after {attempts} attempts")]
    BudgetExhausted { attempts: u32 },

    #[error("solver reported infeasible: {reason}")]
    SolverInfeasible { reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetSchedError>;
