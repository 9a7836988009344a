//! Forward Contraction Hierarchies (FCH) query: a modified Dijkstra over a
//! [`ContractedGraph`] that only ever relaxes edges consistent with the
//! up/down phase rule, optionally pruned by geometrical containers and
//! accelerated by the per-node schedule index.
//!
//! Grounded on `FCH.shortest_path` in
//! `original_source/contraction_hierarchy/forward_search.py`, collapsed from
//! that source's five flag-driven variants into the single phase rule this
//! crate's design settles on.

pub mod dijkstra;

use std::time::{Duration, Instant};

use hashbrown::HashMap;
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::warn;

use crate::atf::INFINITY;
use crate::collections::PriorityQueue;
use crate::contracted_graph::ContractedGraph;
use crate::graph::NodeId;

/// The outcome of an earliest-arrival query, matching the external "query
/// result" contract: expanded stop path, per-hop route labels, absolute
/// arrival time (`atf::INFINITY` when unreachable), and wall-clock cost.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub path: Vec<NodeId>,
    pub routes: Vec<String>,
    pub arrival: i64,
    pub duration_ms: u64,
}

impl QueryResult {
    pub(crate) fn unreachable(start: Instant) -> Self {
        Self {
            path: Vec::new(),
            routes: Vec::new(),
            arrival: INFINITY,
            duration_ms: elapsed_ms(start),
        }
    }
}

/// Tunables for an FCH query. Unreachable/timeout outcomes are recovered
/// into [`QueryResult`] rather than raised as errors, per the crate's
/// error-handling design: query-level concerns are not fatal.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Prune relaxations whose target's down-reachable set excludes the
    /// query target (spec.md §4.4's geometrical-container pruning).
    pub geometrical_containers: bool,
    /// Use the per-node schedule index to skip the in-edge binary search.
    pub optimized_binary_search: bool,
    /// Forbid chaining two consecutive walk-only hops.
    pub forbid_consecutive_walks: bool,
    /// Global walk budget; `None` composes buses only (mirrors the
    /// contraction-time mode chosen for this graph).
    pub max_walk_duration: Option<i64>,
    /// Wall-clock cap checked once per outer loop iteration.
    pub timeout: Option<Duration>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            geometrical_containers: true,
            optimized_binary_search: true,
            forbid_consecutive_walks: false,
            max_walk_duration: None,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
struct NodeState {
    weight: i64,
    down_move: bool,
    sequence: Vec<NodeId>,
    route_names: Vec<String>,
    walk_duration: i64,
}

/// Runs the FCH query described in [`crate::query`]'s module docs.
#[must_use]
pub fn fch_query(
    contracted: &ContractedGraph,
    source: NodeId,
    target: NodeId,
    start_time: i64,
    options: QueryOptions,
) -> QueryResult {
    let start_instant = Instant::now();

    let (Some(source_idx), Some(target_idx)) = (contracted.index_of(source), contracted.index_of(target))
    else {
        warn!(source, target, "unreachable: unknown stop id");
        return QueryResult::unreachable(start_instant);
    };

    if source == target {
        return QueryResult {
            path: vec![source],
            routes: Vec::new(),
            arrival: start_time,
            duration_ms: elapsed_ms(start_instant),
        };
    }

    let budget = options.max_walk_duration.unwrap_or(INFINITY);

    let mut states: HashMap<NodeIndex, NodeState> = HashMap::new();
    let mut settled: hashbrown::HashSet<NodeIndex> = hashbrown::HashSet::new();
    let mut queue: PriorityQueue<NodeIndex> = PriorityQueue::new();

    states.insert(
        source_idx,
        NodeState {
            weight: start_time,
            down_move: false,
            sequence: vec![source],
            route_names: Vec::new(),
            walk_duration: 0,
        },
    );
    queue.push_or_decrease(source_idx, start_time, source);

    let mut last_settled = source_idx;

    loop {
        if let Some(timeout) = options.timeout {
            if start_instant.elapsed() >= timeout {
                warn!(source, target, "query timed out before target settled");
                return partial_result(contracted, last_settled, &states, start_instant);
            }
        }

        let Some((u_idx, u_weight)) = queue.pop() else {
            warn!(source, target, "unreachable: heap exhausted before target settled");
            return QueryResult::unreachable(start_instant);
        };
        settled.insert(u_idx);
        last_settled = u_idx;

        if u_idx == target_idx {
            let state = &states[&u_idx];
            return QueryResult {
                path: state.sequence.clone(),
                routes: state.route_names.clone(),
                arrival: u_weight,
                duration_ms: elapsed_ms(start_instant),
            };
        }

        let u_down_move = states[&u_idx].down_move;
        let u_rank = contracted.hierarchy[&u_idx];
        let u_walk_duration = states[&u_idx].walk_duration;
        let last_hop_was_walk = states[&u_idx]
            .route_names
            .last()
            .map(|label| label == "walk")
            .unwrap_or(false);

        for edge in contracted.graph.edges_directed(u_idx, Direction::Outgoing) {
            let v_idx = edge.target();
            if settled.contains(&v_idx) {
                continue;
            }
            let v_rank = contracted.hierarchy[&v_idx];

            let Some(v_down_move) = phase_allows(
                u_down_move,
                u_rank,
                v_rank,
                v_idx,
                target_idx,
                contracted,
                options.geometrical_containers,
            ) else {
                continue;
            };

            let forbid_walk = options.forbid_consecutive_walks && last_hop_was_walk;
            let atf = edge.weight();
            let arrival = if forbid_walk {
                atf.arrival_bus(u_weight, u_walk_duration, budget)
            } else if options.optimized_binary_search {
                arrival_with_schedule_index(contracted, u_idx, v_idx, atf, u_weight, u_walk_duration, budget, u_down_move)
            } else {
                atf.arrival(u_weight, u_walk_duration, budget)
            };

            if arrival.time >= INFINITY {
                continue;
            }

            let better = states.get(&v_idx).map_or(true, |existing| arrival.time < existing.weight);
            if better {
                let mut sequence = states[&u_idx].sequence.clone();
                sequence.extend(arrival.nodes.iter().skip(1));
                let mut route_names = states[&u_idx].route_names.clone();
                route_names.extend(arrival.route_names.iter().cloned());
                states.insert(
                    v_idx,
                    NodeState {
                        weight: arrival.time,
                        down_move: v_down_move,
                        sequence,
                        route_names,
                        walk_duration: arrival.walk_duration,
                    },
                );
                queue.push_or_decrease(v_idx, arrival.time, contracted.stop_of(v_idx));
            }
        }
    }
}

/// The FCH phase rule (spec.md §4.4): decides whether relaxing `u -> v` is
/// admissible given the current up/down phase, returning the phase `v`
/// would carry if so.
fn phase_allows(
    down_move: bool,
    u_rank: i64,
    v_rank: i64,
    v_idx: NodeIndex,
    target_idx: NodeIndex,
    contracted: &ContractedGraph,
    use_containers: bool,
) -> Option<bool> {
    let reaches_target = || {
        !use_containers
            || contracted
                .geometrical_container
                .get(&v_idx)
                .is_some_and(|set| set.contains(&target_idx))
    };
    if !down_move {
        if v_rank > u_rank {
            return Some(false);
        }
        if v_rank < u_rank && reaches_target() {
            return Some(true);
        }
        None
    } else if v_rank < u_rank && reaches_target() {
        Some(true)
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn arrival_with_schedule_index(
    contracted: &ContractedGraph,
    u_idx: NodeIndex,
    v_idx: NodeIndex,
    atf: &crate::atf::Atf,
    t: i64,
    walk_duration_so_far: i64,
    max_walk_duration: i64,
    down_move: bool,
) -> crate::atf::Arrival {
    let table = if down_move {
        &contracted.schedule_down
    } else {
        &contracted.schedule
    };
    if let Some(index) = table.get(&u_idx) {
        let slot = index.slot_for(t);
        if slot < index.schedule.len() {
            if let Some(&start) = index.position[slot].get(&v_idx) {
                return atf.arrival_with_known_index(t, start, walk_duration_so_far, max_walk_duration);
            }
        }
    }
    atf.arrival(t, walk_duration_so_far, max_walk_duration)
}

fn partial_result(
    contracted: &ContractedGraph,
    last_settled: NodeIndex,
    states: &HashMap<NodeIndex, NodeState>,
    start: Instant,
) -> QueryResult {
    states.get(&last_settled).map_or_else(
        || QueryResult::unreachable(start),
        |state| QueryResult {
            path: state.sequence.clone(),
            routes: state.route_names.clone(),
            arrival: state.weight,
            duration_ms: elapsed_ms(start),
        },
    )
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
