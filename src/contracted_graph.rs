//! The frozen result of contraction: the accumulated shortcut graph plus the
//! auxiliary indices an FCH query relies on — hierarchy ranks, down-reachable
//! "geometrical containers", and per-node departure-schedule lookup tables.
//!
//! Grounded on `ContactionTransportGraph` in
//! `original_source/contraction_hierarchy/graph.py`
//! (`geometrical_container`/`dfs`, `optimize_binary_search`).

use hashbrown::{HashMap, HashSet};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::atf::Atf;
use crate::graph::NodeId;
use crate::query::{self, QueryOptions, QueryResult};
use crate::Error;

/// Per-node schedule acceleration table: the sorted, deduplicated set of
/// departure times across a node's outgoing edges, plus, for each schedule
/// slot and neighbour, the smallest bus index with `d >= slot`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScheduleIndex {
    pub(crate) schedule: Vec<i64>,
    pub(crate) position: Vec<HashMap<NodeIndex, usize>>,
}

impl ScheduleIndex {
    /// The schedule slot `t` falls into: the smallest index `k` with
    /// `schedule[k] >= t`, or `schedule.len()` if `t` is after every slot.
    pub(crate) fn slot_for(&self, t: i64) -> usize {
        self.schedule.partition_point(|&d| d < t)
    }
}

/// A contracted transit network ready for FCH queries.
#[derive(Debug, Clone)]
pub struct ContractedGraph {
    pub(crate) graph: StableDiGraph<NodeId, Atf>,
    pub(crate) node_index: HashMap<NodeId, NodeIndex>,
    pub(crate) hierarchy: HashMap<NodeIndex, i64>,
    pub(crate) geometrical_container: HashMap<NodeIndex, HashSet<NodeIndex>>,
    pub(crate) schedule: HashMap<NodeIndex, ScheduleIndex>,
    pub(crate) schedule_down: HashMap<NodeIndex, ScheduleIndex>,
    pub(crate) max_walk_duration: Option<i64>,
}

impl ContractedGraph {
    pub(crate) fn build(
        graph: StableDiGraph<NodeId, Atf>,
        node_index: HashMap<NodeId, NodeIndex>,
        hierarchy: HashMap<NodeIndex, i64>,
        max_walk_duration: Option<i64>,
    ) -> Result<Self, Error> {
        let geometrical_container = build_geometrical_containers(&graph, &hierarchy)?;
        let schedule = build_schedule_index(&graph, &hierarchy, None)?;
        let schedule_down = build_schedule_index(&graph, &hierarchy, Some(&hierarchy))?;

        Ok(Self {
            graph,
            node_index,
            hierarchy,
            geometrical_container,
            schedule,
            schedule_down,
            max_walk_duration,
        })
    }

    #[must_use]
    pub fn hierarchy_rank(&self, stop: NodeId) -> Option<i64> {
        let index = *self.node_index.get(&stop)?;
        self.hierarchy.get(&index).copied()
    }

    pub(crate) fn index_of(&self, stop: NodeId) -> Option<NodeIndex> {
        self.node_index.get(&stop).copied()
    }

    pub(crate) fn stop_of(&self, index: NodeIndex) -> NodeId {
        *self
            .graph
            .node_weight(index)
            .expect("every live NodeIndex maps to a stop id")
    }

    /// Answers an earliest-arrival query with the modified Dijkstra
    /// described in the FCH query design.
    #[must_use]
    pub fn query(
        &self,
        source: NodeId,
        target: NodeId,
        start_time: i64,
        options: QueryOptions,
    ) -> QueryResult {
        query::fch_query(self, source, target, start_time, options)
    }
}

/// DFS over outgoing edges whose target has a strictly lower hierarchy rank
/// than the current node, collecting the visited set. Self-inclusive: `node`
/// is seeded into its own `visited` before the DFS runs, so `node` is always
/// a member of `geometrical_container[node]`.
fn build_geometrical_containers(
    graph: &StableDiGraph<NodeId, Atf>,
    hierarchy: &HashMap<NodeIndex, i64>,
) -> Result<HashMap<NodeIndex, HashSet<NodeIndex>>, Error> {
    let mut containers = HashMap::new();
    for node in graph.node_indices() {
        if !hierarchy.contains_key(&node) {
            return Err(Error::InvariantViolation("hierarchy missing a node".to_string()));
        }
        let mut visited = HashSet::new();
        visited.insert(node);
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let current_rank = hierarchy[&current];
            for edge in graph.edges_directed(current, Direction::Outgoing) {
                let next = edge.target();
                let next_rank = hierarchy[&next];
                if next_rank < current_rank && visited.insert(next) {
                    stack.push(next);
                }
            }
        }
        containers.insert(node, visited);
    }
    Ok(containers)
}

/// Builds the per-node schedule table. When `restrict_descending` is
/// `Some(hierarchy)`, only edges whose target has lower rank are indexed
/// (the `_down` variant used by the downward phase of a query).
fn build_schedule_index(
    graph: &StableDiGraph<NodeId, Atf>,
    hierarchy: &HashMap<NodeIndex, i64>,
    restrict_descending: Option<&HashMap<NodeIndex, i64>>,
) -> Result<HashMap<NodeIndex, ScheduleIndex>, Error> {
    let mut indices = HashMap::new();
    for node in graph.node_indices() {
        let node_rank = hierarchy[&node];
        let edges: Vec<_> = graph
            .edges_directed(node, Direction::Outgoing)
            .filter(|edge| match restrict_descending {
                Some(h) => h[&edge.target()] < node_rank,
                None => true,
            })
            .collect();

        let mut schedule: Vec<i64> = edges
            .iter()
            .flat_map(|edge| edge.weight().departure_times())
            .collect();
        schedule.sort_unstable();
        schedule.dedup();

        let position = schedule
            .iter()
            .map(|&dep| {
                edges
                    .iter()
                    .map(|edge| {
                        let atf = edge.weight();
                        let index = atf.buses.partition_point(|bus| bus.d < dep);
                        (edge.target(), index)
                    })
                    .collect::<HashMap<_, _>>()
            })
            .collect();

        indices.insert(node, ScheduleIndex { schedule, position });
    }
    Ok(indices)
}
