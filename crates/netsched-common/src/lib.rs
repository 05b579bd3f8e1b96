//! Shared data model, configuration, error types, and topology/job loaders
//! for the netsched admission-control and traffic-engineering engines.
//!
//! No scheduling logic lives in this crate — see `netsched-core`.

pub mod config;
pub mod error;
pub mod graph;
pub mod ids;
pub mod loader;
pub mod schedule;
pub mod traffic;
pub mod workload;

pub use config::EngineConfig;
pub use error::{NetSchedError, Result};
pub use graph::{Graph, Link};
pub use ids::{JobId, LinkId, NodeId};
pub use schedule::{JobSchedule, Tunnel};
pub use traffic::LinkTrafficPattern;
pub use workload::{Job, Workload};
