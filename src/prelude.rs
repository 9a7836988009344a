//! Convenience re-export of the crate's everyday surface.

pub use crate::atf::{Atf, Arrival};
pub use crate::contracted_graph::ContractedGraph;
pub use crate::contraction::ContractionBuilder;
pub use crate::graph::{Connection, NodeId, TransportGraph, WalkConnection};
pub use crate::query::{fch_query, QueryOptions, QueryResult};
pub use crate::trip::{Bus, Walk};
pub use crate::Error;
