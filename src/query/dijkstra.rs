//! Reference time-dependent Dijkstra over the uncontracted [`TransportGraph`].
//! Kept as a first-class, public operation: the `arrival` it reports is the
//! ground truth an FCH query on the contracted graph must match.
//!
//! Grounded on `time_dependent_dijkstra` in
//! `cascade_core::algo::dijkstra` (binary-heap relaxation, `Occupied`/
//! `Vacant` entry update) and on `original_source/contraction_hierarchy/dijkstra.py`.

use std::time::Instant;

use hashbrown::hash_map::Entry::{Occupied, Vacant};
use hashbrown::{HashMap, HashSet};
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::warn;

use crate::atf::INFINITY;
use crate::collections::PriorityQueue;
use crate::graph::{NodeId, TransportGraph};
use crate::query::QueryResult;

/// Earliest arrival from `source` to `target` departing at `start_time`,
/// found by an unaccelerated time-dependent Dijkstra over every edge in
/// `graph`. `max_walk_duration` bounds cumulative walk time exactly as it
/// does for [`crate::query::fch_query`]; `None` forbids walking entirely for
/// the purposes of the walk budget (buses only compose unconstrained).
#[must_use]
pub fn earliest_arrival(
    graph: &TransportGraph,
    source: NodeId,
    target: NodeId,
    start_time: i64,
    max_walk_duration: Option<i64>,
) -> QueryResult {
    let start_instant = Instant::now();
    let budget = max_walk_duration.unwrap_or(INFINITY);

    let (Some(source_idx), Some(target_idx)) = (graph.node_index(source), graph.node_index(target))
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

    struct State {
        weight: i64,
        walk_duration: i64,
        sequence: Vec<NodeId>,
        route_names: Vec<String>,
    }

    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut best: HashMap<NodeIndex, State> = HashMap::new();
    let mut queue: PriorityQueue<NodeIndex> = PriorityQueue::new();

    best.insert(
        source_idx,
        State {
            weight: start_time,
            walk_duration: 0,
            sequence: vec![source],
            route_names: Vec::new(),
        },
    );
    queue.push_or_decrease(source_idx, start_time, 0);

    while let Some((node, weight)) = queue.pop() {
        if visited.contains(&node) {
            continue;
        }
        if node == target_idx {
            let state = &best[&node];
            return QueryResult {
                path: state.sequence.clone(),
                routes: state.route_names.clone(),
                arrival: weight,
                duration_ms: elapsed_ms(start_instant),
            };
        }

        for edge in graph.edges_directed(node, Direction::Outgoing) {
            let next = edge.target();
            if visited.contains(&next) {
                continue;
            }
            let current_walk = best[&node].walk_duration;
            let arrival = edge.weight().arrival(weight, current_walk, budget);
            if arrival.time >= INFINITY {
                continue;
            }

            match best.entry(next) {
                Occupied(mut entry) => {
                    if arrival.time < entry.get().weight {
                        let mut sequence = best[&node].sequence.clone();
                        sequence.extend(arrival.nodes.iter().skip(1));
                        let mut route_names = best[&node].route_names.clone();
                        route_names.extend(arrival.route_names.iter().cloned());
                        entry.insert(State {
                            weight: arrival.time,
                            walk_duration: arrival.walk_duration,
                            sequence,
                            route_names,
                        });
                        queue.push_or_decrease(next, arrival.time, 0);
                    }
                }
                Vacant(entry) => {
                    let mut sequence = best[&node].sequence.clone();
                    sequence.extend(arrival.nodes.iter().skip(1));
                    let mut route_names = best[&node].route_names.clone();
                    route_names.extend(arrival.route_names.iter().cloned());
                    entry.insert(State {
                        weight: arrival.time,
                        walk_duration: arrival.walk_duration,
                        sequence,
                        route_names,
                    });
                    queue.push_or_decrease(next, arrival.time, 0);
                }
            }
        }
        visited.insert(node);
    }

    warn!(source, target, "unreachable: heap exhausted before target settled");
    QueryResult::unreachable(start_instant)
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
