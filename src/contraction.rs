//! Node-contraction: repeatedly eliminate the lowest-priority node, wiring
//! shortcut `Atf`s between its neighbours so that the remaining graph keeps
//! exact earliest-arrival answers. Produces a frozen
//! [`crate::contracted_graph::ContractedGraph`].
//!
//! Grounded on `TransportGraph.contraction_hierarchy` in
//! `original_source/contraction_hierarchy/graph.py`: the `graph`/`in_nodes`
//! dictionaries there (mutated/shrunk per step) correspond to `working`
//! below, and `new_graph` (only ever gaining edges) corresponds to
//! `contracted`.

use hashbrown::HashMap;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use crate::atf::{composition, composition_buses, min_atf, Atf};
use crate::collections::PriorityQueue;
use crate::contracted_graph::ContractedGraph;
use crate::graph::{NodeId, TransportGraph};
use crate::query::QueryOptions;
use crate::Error;

/// Drives contraction of a [`TransportGraph`] into a [`ContractedGraph`].
pub struct ContractionBuilder {
    working: StableDiGraph<NodeId, Atf>,
    contracted: StableDiGraph<NodeId, Atf>,
    node_index: HashMap<NodeId, NodeIndex>,
    depth: HashMap<NodeIndex, i64>,
    max_walk_duration: Option<i64>,
}

impl ContractionBuilder {
    /// `max_walk_duration` fixes the single global walk-budget mode for this
    /// run (spec.md §9): `None` uses `composition_buses` (no walk legs in
    /// shortcuts), `Some(budget)` uses full `composition` with that budget.
    #[must_use]
    pub fn new(graph: TransportGraph, max_walk_duration: Option<i64>) -> Self {
        let (working, node_index) = graph.into_parts();
        let contracted = working.clone();
        Self {
            working,
            contracted,
            node_index,
            depth: HashMap::new(),
            max_walk_duration,
        }
    }

    fn depth_of(&self, node: NodeIndex) -> i64 {
        self.depth.get(&node).copied().unwrap_or(0)
    }

    fn edge_difference(&self, node: NodeIndex) -> i64 {
        let out_deg = self.working.edges_directed(node, Direction::Outgoing).count() as i64;
        let in_deg = self.working.edges_directed(node, Direction::Incoming).count() as i64;
        out_deg * in_deg - (out_deg + in_deg)
    }

    fn priority(&self, node: NodeIndex) -> i64 {
        self.edge_difference(node) + self.depth_of(node)
    }

    fn node_id(&self, node: NodeIndex) -> NodeId {
        *self
            .working
            .node_weight(node)
            .or_else(|| self.contracted.node_weight(node))
            .expect("node id present in either graph for any live NodeIndex")
    }

    fn compose(&self, f: &Atf, g: &Atf) -> Option<Atf> {
        match self.max_walk_duration {
            Some(budget) => composition(g, f, budget),
            None => composition_buses(g, f),
        }
    }

    /// Runs contraction to completion and builds the auxiliary indices
    /// (geometrical containers, schedule tables) over the result.
    pub fn contract(mut self) -> Result<ContractedGraph, Error> {
        let mut queue: PriorityQueue<NodeIndex> = PriorityQueue::new();
        for node in self.working.node_indices() {
            let priority = self.priority(node);
            queue.push_or_decrease(node, priority, self.node_id(node));
        }

        let mut hierarchy: HashMap<NodeIndex, i64> = HashMap::new();
        let mut rank = 0i64;
        let total = self.working.node_count();

        while let Some((n, _)) = queue.pop() {
            if !self.working.contains_node(n) {
                continue;
            }
            let new_depth = self.depth_of(n) + 1;

            let incoming: Vec<NodeIndex> = self
                .working
                .edges_directed(n, Direction::Incoming)
                .map(|e| e.source())
                .collect();
            let outgoing: Vec<NodeIndex> = self
                .working
                .edges_directed(n, Direction::Outgoing)
                .map(|e| e.target())
                .collect();

            // Every incoming/outgoing neighbour loses its edge to `n` this
            // step regardless of whether a shortcut was synthesised for it,
            // so all of them need a depth bump and a fresh priority.
            let mut touched: Vec<NodeIndex> = incoming.iter().chain(outgoing.iter()).copied().collect();
            for &p in &incoming {
                let f = self
                    .working
                    .edge_weight(self.working.find_edge(p, n).expect("incoming edge to n"))
                    .expect("edge weight")
                    .clone();
                for &q in &outgoing {
                    if p == q {
                        continue;
                    }
                    let g = self
                        .working
                        .edge_weight(self.working.find_edge(n, q).expect("outgoing edge from n"))
                        .expect("edge weight")
                        .clone();
                    let Some(mut shortcut) = self.compose(&f, &g) else {
                        continue;
                    };
                    if let Some(existing_edge) = self.working.find_edge(p, q) {
                        let existing = self.working.edge_weight(existing_edge).unwrap().clone();
                        shortcut = min_atf(&shortcut, &existing);
                    }
                    install_edge(&mut self.working, p, q, shortcut.clone());
                    install_edge(&mut self.contracted, p, q, shortcut);
                }
            }

            self.working.remove_node(n);
            hierarchy.insert(n, rank);
            rank += 1;

            touched.sort_unstable();
            touched.dedup();
            for node in touched {
                let updated = self.depth_of(node).max(new_depth);
                self.depth.insert(node, updated);
                let priority = self.priority(node);
                queue.push_or_decrease(node, priority, self.node_id(node));
            }

            debug!(contracted = rank, remaining = queue.len(), "contraction step");
        }

        if hierarchy.len() != total {
            return Err(Error::InvariantViolation(
                "contraction did not assign a hierarchy rank to every node".to_string(),
            ));
        }

        ContractedGraph::build(
            self.contracted,
            self.node_index,
            hierarchy,
            self.max_walk_duration,
        )
    }
}

fn install_edge(graph: &mut StableDiGraph<NodeId, Atf>, p: NodeIndex, q: NodeIndex, atf: Atf) {
    if let Some(edge) = graph.find_edge(p, q) {
        *graph.edge_weight_mut(edge).unwrap() = atf;
    } else {
        graph.add_edge(p, q, atf);
    }
}
