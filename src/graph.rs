//! `TransportGraph`: the time-dependent transit network the whole crate
//! operates on. Wraps a `petgraph::stable_graph::StableDiGraph` keyed by
//! opaque external [`NodeId`]s, with one `Atf` per directed edge.

use std::ops::{Deref, DerefMut};

use hashbrown::HashMap;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::atf::Atf;
use crate::trip::{Bus, Walk};
use crate::Error;

/// Caller-facing stop identifier. Distinct from `petgraph`'s internal
/// `NodeIndex`, which is only meaningful inside a single graph instance and
/// is invalidated by node removal — `NodeId` is stable across the whole
/// ingestion → contraction → query pipeline.
pub type NodeId = i64;

/// One raw timetabled connection, as read from a GTFS-derived connections
/// table or supplied programmatically.
#[derive(Debug, Clone)]
pub struct Connection {
    pub from_stop: NodeId,
    pub to_stop: NodeId,
    pub departure: i64,
    pub arrival: i64,
    pub route: String,
}

/// One raw constant-duration walking link between two stops.
#[derive(Debug, Clone)]
pub struct WalkConnection {
    pub from_stop: NodeId,
    pub to_stop: NodeId,
    pub duration: i64,
}

/// Time-dependent transit network: nodes are stops, edges carry an `Atf`
/// (a walk arm plus a sorted, dominance-pruned bus timetable).
///
/// `StableDiGraph` is used rather than `petgraph::graph::DiGraph` because
/// contraction removes nodes one at a time and the surviving nodes' indices
/// must remain valid throughout the run.
#[derive(Debug, Clone)]
pub struct TransportGraph {
    graph: StableDiGraph<NodeId, Atf>,
    node_index: HashMap<NodeId, NodeIndex>,
}

impl TransportGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
        }
    }

    /// Looks up the internal `NodeIndex` for an external stop id, inserting
    /// a fresh node if this is the first time it's seen.
    pub fn ensure_node(&mut self, stop: NodeId) -> NodeIndex {
        let graph = &mut self.graph;
        *self
            .node_index
            .entry(stop)
            .or_insert_with(|| graph.add_node(stop))
    }

    #[must_use]
    pub fn node_index(&self, stop: NodeId) -> Option<NodeIndex> {
        self.node_index.get(&stop).copied()
    }

    pub fn try_node_index(&self, stop: NodeId) -> Result<NodeIndex, Error> {
        self.node_index(stop).ok_or(Error::NodeNotFound(stop))
    }

    #[must_use]
    pub fn stop_of(&self, index: NodeIndex) -> Option<NodeId> {
        self.graph.node_weight(index).copied()
    }

    pub(crate) fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, atf: Atf) {
        self.graph.add_edge(source, target, atf);
    }

    /// Builds a graph from plain Rust collections of raw connections: groups
    /// by `(from_stop, to_stop)`, turns each group's rows into a sorted
    /// `Bus` list, attaches the single walk alternative (if any) for that
    /// pair, and `cut`s the combined profile once.
    pub fn from_connections(
        transit: impl IntoIterator<Item = Connection>,
        walks: impl IntoIterator<Item = WalkConnection>,
    ) -> Result<Self, Error> {
        let mut graph = Self::new();

        let mut buses_by_pair: HashMap<(NodeId, NodeId), Vec<Bus>> = HashMap::new();
        for conn in transit {
            if conn.arrival < conn.departure {
                return Err(Error::NegativeWeight(conn.from_stop, conn.to_stop));
            }
            graph.ensure_node(conn.from_stop);
            graph.ensure_node(conn.to_stop);
            buses_by_pair
                .entry((conn.from_stop, conn.to_stop))
                .or_default()
                .push(Bus::new(
                    vec![conn.from_stop, conn.to_stop],
                    vec![conn.route],
                    conn.departure,
                    conn.arrival,
                ));
        }

        let mut walks_by_pair: HashMap<(NodeId, NodeId), Walk> = HashMap::new();
        for walk in walks {
            if walk.duration < 0 {
                return Err(Error::NegativeWeight(walk.from_stop, walk.to_stop));
            }
            graph.ensure_node(walk.from_stop);
            graph.ensure_node(walk.to_stop);
            walks_by_pair.insert(
                (walk.from_stop, walk.to_stop),
                Walk::new(vec![walk.from_stop, walk.to_stop], walk.duration),
            );
        }

        let mut pairs: Vec<(NodeId, NodeId)> = buses_by_pair
            .keys()
            .chain(walks_by_pair.keys())
            .copied()
            .collect();
        pairs.sort_unstable();
        pairs.dedup();

        for pair in pairs {
            let mut buses = buses_by_pair.remove(&pair).unwrap_or_default();
            buses.sort();
            let walk = walks_by_pair.remove(&pair);
            let mut atf = Atf::new(walk, buses);
            atf.cut();
            let source = graph.try_node_index(pair.0)?;
            let target = graph.try_node_index(pair.1)?;
            graph.add_edge(source, target, atf);
        }

        Ok(graph)
    }

    pub fn stop_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_index.keys().copied()
    }

    /// Decomposes into the underlying graph and the external-id index, for
    /// handoff to [`crate::contraction::ContractionBuilder`].
    pub(crate) fn into_parts(self) -> (StableDiGraph<NodeId, Atf>, HashMap<NodeId, NodeIndex>) {
        (self.graph, self.node_index)
    }
}

impl Default for TransportGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Exposes the full `StableDiGraph` API (neighbours, edge lookup,
/// iteration) directly on `TransportGraph`.
impl Deref for TransportGraph {
    type Target = StableDiGraph<NodeId, Atf>;

    fn deref(&self) -> &Self::Target {
        &self.graph
    }
}

impl DerefMut for TransportGraph {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.graph
    }
}
