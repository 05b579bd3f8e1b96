use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a node in the [`crate::graph::Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Dense, insertion-order identifier for a directed link. Contiguous from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkId(pub u32);

/// Identifier for a job, unique within one scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u32);

macro_rules! id_newtype {
    ($t:ty) => {
        impl From<u32> for $t {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }
        impl From<$t> for u32 {
            fn from(v: $t) -> Self {
                v.0
            }
        }
        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(NodeId);
id_newtype!(LinkId);
id_newtype!(JobId);
