//! The algorithmic core: path finding, the periodic-traffic
//! peak-bandwidth engine, the four Phase-1 admission-control variants and
//! the four Phase-2 traffic-engineering variants, and the result emitter.

pub mod admission;
pub mod emitter;
pub mod pathfinder;
pub mod peak;
pub mod traffic_engineer;

pub use admission::{AdmissionContext, AdmissionStrategy};
pub use pathfinder::PathFinder;
pub use peak::{PeakBandwidth, PeakEngine};
pub use traffic_engineer::{TrafficContext, TrafficEngineer};
