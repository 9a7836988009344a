/*!
Time-dependent Contraction Hierarchies for earliest-arrival transit routing.

The core pipeline is: build a [`graph::TransportGraph`] from timetabled
connections and walk links, run [`contraction::ContractionBuilder`] to
produce a [`contracted_graph::ContractedGraph`], then answer earliest-arrival
queries against it with [`query::fch_query`] (accelerated) or
[`query::dijkstra::earliest_arrival`] (reference, uncontracted).

# Example
```ignore
use transit_ch::prelude::*;

let graph = TransportGraph::from_connections(transit_rows, walk_rows)?;
let contracted = ContractionBuilder::new(graph, None).contract()?;
let result = contracted.query(origin, destination, departure_time, QueryOptions::default());
println!("arrival: {}", result.arrival);
```
*/

use thiserror::Error;

use crate::graph::NodeId;

pub mod atf;
pub mod collections;
pub mod contracted_graph;
pub mod contraction;
pub mod graph;
pub mod loaders;
pub mod prelude;
pub mod query;
pub mod trip;

/// Errors raised while building, ingesting into, or contracting a
/// [`graph::TransportGraph`]. Query-time outcomes (unreachable, timed out)
/// are not errors — see [`query::QueryResult`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("negative-duration connection: {0} -> {1}")]
    NegativeWeight(NodeId, NodeId),
    #[error("node not found for id: {0}")]
    NodeNotFound(NodeId),
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("missing value in column: {0}")]
    MissingValue(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    PolarsError(#[from] polars::prelude::PolarsError),
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}
