//! The Arrival-Time Function (ATF) algebra: an edge profile mapping a
//! departure time to the earliest feasible arrival time along that edge,
//! plus the operations used to build and contract a transit graph from
//! these profiles — `cut` (dominance pruning), `min_atf` (pointwise
//! minimum), `composition`/`composition_buses` (shortcut synthesis), and
//! the `arrival*` family (query-time evaluation).
//!
//! Ported from `original_source/contraction_hierarchy/atf.py`.

use serde::{Deserialize, Serialize};

use crate::trip::{Bus, Walk};

/// Sentinel standing in for "no feasible time" in the integer time domain.
/// Deliberately short of `i64::MAX` so that two sentinels can be summed
/// during composition (e.g. `self.walk.w + f.walk.w` when both are absent)
/// without overflowing.
pub const INFINITY: i64 = i64::MAX / 4;

/// One outcome of evaluating an `Atf` at a departure time: the arrival time,
/// the stop sequence and route labels realised, and (when a walk budget is
/// active) the cumulative walk duration consumed by this choice.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub time: i64,
    pub nodes: Vec<i64>,
    pub route_names: Vec<String>,
    pub walk_duration: i64,
}

impl Arrival {
    const fn unreachable() -> Self {
        Self {
            time: INFINITY,
            nodes: Vec::new(),
            route_names: Vec::new(),
            walk_duration: INFINITY,
        }
    }
}

/// A time-dependent edge profile: an optional constant-time walk plus a
/// strictly `(d, a)`-monotone sequence of timetabled buses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atf {
    pub walk: Option<Walk>,
    pub buses: Vec<Bus>,
}

impl Atf {
    #[must_use]
    pub fn new(walk: Option<Walk>, buses: Vec<Bus>) -> Self {
        Self { walk, buses }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.walk.is_none() && self.buses.is_empty()
    }

    /// Dominance-pruning scan: reduce `buses` (assumed sorted by `d`) to the
    /// maximal subsequence strictly increasing in both `d` and `a`. A later
    /// departure with a no-better arrival is dropped; of two buses sharing a
    /// departure, the one with the smaller (better) arrival wins.
    ///
    /// Idempotent: running `cut` again on an already-cut sequence is a no-op.
    pub fn cut(&mut self) {
        let mut stack: Vec<Bus> = Vec::with_capacity(self.buses.len());
        let mut i = 0;
        while i < self.buses.len() {
            match stack.last() {
                None => {
                    stack.push(self.buses[i].clone());
                    i += 1;
                }
                Some(top) => {
                    let candidate = &self.buses[i];
                    if candidate.a > top.a {
                        if top.d < candidate.d {
                            stack.push(candidate.clone());
                        }
                        i += 1;
                    } else if candidate.a == top.a && top.d == candidate.d {
                        let candidate = candidate.clone();
                        *stack.last_mut().unwrap() = candidate;
                        i += 1;
                    } else {
                        // candidate.a <= top.a with top.d < candidate.d (or
                        // candidate.a == top.a with an earlier d): candidate
                        // dominates top. Pop and re-examine against the new
                        // top without advancing i.
                        stack.pop();
                    }
                }
            }
        }
        self.buses = stack;
    }

    /// Departure times this edge's schedule touches, used to build a node's
    /// global `nodes_schedule` fingerprint (spec.md §4.1.5).
    pub fn departure_times(&self) -> impl Iterator<Item = i64> + '_ {
        self.buses.iter().map(|bus| bus.d)
    }

    /// Earliest feasible arrival departing at `t`, considering both the walk
    /// and bus arms. With a finite `max_walk_duration`, a bus is only
    /// considered if its embedded `departure_walk` plus `walk_duration_so_far`
    /// stays within budget, and the walk arm only if the accumulated walk
    /// would still fit.
    #[must_use]
    pub fn arrival(&self, t: i64, walk_duration_so_far: i64, max_walk_duration: i64) -> Arrival {
        let bus = self.arrival_bus(t, walk_duration_so_far, max_walk_duration);
        let walk = self.arrival_walk(t, walk_duration_so_far, max_walk_duration);
        if walk.time < bus.time {
            walk
        } else {
            bus
        }
    }

    /// The walk arm only of `arrival`.
    #[must_use]
    pub fn arrival_walk(&self, t: i64, walk_duration_so_far: i64, max_walk_duration: i64) -> Arrival {
        let Some(walk) = &self.walk else {
            return Arrival::unreachable();
        };
        let new_walk_duration = walk_duration_so_far + walk.w;
        if new_walk_duration > max_walk_duration {
            return Arrival::unreachable();
        }
        Arrival {
            time: t + walk.w,
            nodes: walk.nodes.clone(),
            route_names: walk.route_names.clone(),
            walk_duration: new_walk_duration,
        }
    }

    /// The bus arm only of `arrival`. `walk_duration_so_far` is the walk
    /// consumed by earlier edges on the query path; the returned
    /// `walk_duration` adds this edge's own embedded walk (`bus.arrival_walk`,
    /// local to this one profile) on top of it.
    #[must_use]
    pub fn arrival_bus(&self, t: i64, walk_duration_so_far: i64, max_walk_duration: i64) -> Arrival {
        let allowed = max_walk_duration.saturating_sub(walk_duration_so_far);
        let start = self.buses.partition_point(|bus| bus.d < t);
        for bus in &self.buses[start..] {
            if bus.departure_walk <= allowed {
                return Arrival {
                    time: bus.a,
                    nodes: bus.nodes.clone(),
                    route_names: bus.route_names.clone(),
                    walk_duration: walk_duration_so_far + bus.arrival_walk,
                };
            }
        }
        Arrival::unreachable()
    }

    /// Arrival using a precomputed starting bus index (spec.md §4.1.5
    /// schedule-slot acceleration): `start_index` must already be the
    /// smallest index with `buses[start_index].d >= t`.
    #[must_use]
    pub fn arrival_with_known_index(
        &self,
        t: i64,
        start_index: usize,
        walk_duration_so_far: i64,
        max_walk_duration: i64,
    ) -> Arrival {
        let allowed = max_walk_duration.saturating_sub(walk_duration_so_far);
        let bus_arrival = self.buses[start_index..]
            .iter()
            .find(|bus| bus.departure_walk <= allowed)
            .map_or_else(Arrival::unreachable, |bus| Arrival {
                time: bus.a,
                nodes: bus.nodes.clone(),
                route_names: bus.route_names.clone(),
                walk_duration: walk_duration_so_far + bus.arrival_walk,
            });
        let walk_arrival = self.arrival_walk(t, walk_duration_so_far, max_walk_duration);
        if walk_arrival.time < bus_arrival.time {
            walk_arrival
        } else {
            bus_arrival
        }
    }
}

/// Pointwise minimum of two profiles between the same endpoint pair: the
/// shorter walk, and the union of both bus sequences passed through `cut`.
#[must_use]
pub fn min_atf(f: &Atf, g: &Atf) -> Atf {
    let walk = match (&f.walk, &g.walk) {
        (Some(fw), Some(gw)) => Some(if fw.w <= gw.w { fw.clone() } else { gw.clone() }),
        (Some(fw), None) => Some(fw.clone()),
        (None, Some(gw)) => Some(gw.clone()),
        (None, None) => None,
    };
    let mut buses = f.buses.clone();
    buses.extend(g.buses.iter().cloned());
    buses.sort();
    let mut merged = Atf::new(walk, buses);
    merged.cut();
    merged
}

/// Concatenate two node-sequences that share the boundary node, dropping the
/// duplicate.
fn concat_nodes(first: &[i64], second: &[i64]) -> Vec<i64> {
    let mut out = Vec::with_capacity(first.len() + second.len() - 1);
    out.extend_from_slice(first);
    out.extend_from_slice(&second[1..]);
    out
}

fn concat_routes(first: &[String], second: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(first.len() + second.len());
    out.extend_from_slice(first);
    out.extend_from_slice(second);
    out
}

/// Composition of `f: u -> m` followed by `g: m -> v` (called as
/// `composition(&g, &f, ...)`), synthesising the shortcut edge `u -> v` that
/// results from contracting the intermediate node `m`.
///
/// Produces three kinds of candidate buses:
/// - `cc` (bus then bus): for each f-bus, the g-bus reached by boarding it at
///   the earliest feasible departure after the f-bus's arrival (the same
///   rule `arrival_bus` itself uses), found via a two-pointer sweep that
///   relies on both sequences being strictly `(d, a)`-monotone.
/// - `cw` (bus then walk): for each f-bus, walking from `m` onward — emitted
///   only when it beats that f-bus's matched `cc` candidate (the
///   dominance-aware variant spec.md §9 directs; a non-beating `cw` would be
///   removed by the subsequent `cut` anyway).
/// - `wc` (walk then bus): for each g-bus, walking into `m` then boarding —
///   always emitted when within budget.
///
/// The combined candidate list is sorted by `d` and `cut`.
#[must_use]
pub fn composition(g: &Atf, f: &Atf, max_walk_duration: i64) -> Option<Atf> {
    let mut candidates = Vec::new();

    let walk = match (&f.walk, &g.walk) {
        (Some(fw), Some(gw)) => {
            let w = fw.w + gw.w;
            if w <= max_walk_duration {
                Some(Walk {
                    w,
                    nodes: concat_nodes(&fw.nodes, &gw.nodes),
                    route_names: concat_routes(&fw.route_names, &gw.route_names),
                })
            } else {
                None
            }
        }
        _ => None,
    };

    let mut j = 0usize;
    for fb in &f.buses {
        while j < g.buses.len() && g.buses[j].d < fb.a {
            j += 1;
        }
        let cc_bus = (j < g.buses.len()).then(|| cc_bus(fb, &g.buses[j]));
        let cw_bus = cw_bus(fb, &g.walk, max_walk_duration);

        match (&cc_bus, &cw_bus) {
            (Some(cc), Some(cw)) => {
                candidates.push(cc.clone());
                if cw.a < cc.a {
                    candidates.push(cw.clone());
                }
            }
            (Some(cc), None) => candidates.push(cc.clone()),
            (None, Some(cw)) => candidates.push(cw.clone()),
            (None, None) => {}
        }
    }
    for gb in &g.buses {
        if let Some(bus) = wc_bus(&f.walk, gb, max_walk_duration) {
            candidates.push(bus);
        }
    }

    candidates.sort();

    if walk.is_none() && candidates.is_empty() {
        return None;
    }
    let mut result = Atf::new(walk, candidates);
    result.cut();
    Some(result)
}

fn cc_bus(fb: &Bus, gb: &Bus) -> Bus {
    Bus::new(
        concat_nodes(&fb.nodes, &gb.nodes),
        concat_routes(&fb.route_names, &gb.route_names),
        fb.d,
        gb.a,
    )
    .with_walk_accounting(fb.departure_walk, gb.arrival_walk)
}

fn cw_bus(fb: &Bus, g_walk: &Option<Walk>, max_walk_duration: i64) -> Option<Bus> {
    let walk = g_walk.as_ref()?;
    let arrival_walk = fb.arrival_walk + walk.w;
    if arrival_walk > max_walk_duration {
        return None;
    }
    Some(
        Bus::new(
            concat_nodes(&fb.nodes, &walk.nodes),
            concat_routes(&fb.route_names, &walk.route_names),
            fb.d,
            fb.a + walk.w,
        )
        .with_walk_accounting(fb.departure_walk, arrival_walk),
    )
}

fn wc_bus(f_walk: &Option<Walk>, gb: &Bus, max_walk_duration: i64) -> Option<Bus> {
    let walk = f_walk.as_ref()?;
    let departure_walk = gb.departure_walk + walk.w;
    if departure_walk > max_walk_duration {
        return None;
    }
    Some(
        Bus::new(
            concat_nodes(&walk.nodes, &gb.nodes),
            concat_routes(&walk.route_names, &gb.route_names),
            gb.d - walk.w,
            gb.a,
        )
        .with_walk_accounting(departure_walk, gb.arrival_walk),
    )
}

/// Bus-only specialisation of `composition` used during contraction when
/// walk-budget accounting is not in play: only `cc` candidates are produced.
/// The result is left un-`cut`, matching the original: when a pre-existing
/// `(p, q)` edge is present the contraction loop re-merges against it via
/// `min_atf`, which performs the final `cut`; when there is none, the raw
/// result is installed as-is. Distinct `f`-buses can map to the same
/// earliest-compatible `g`-bus, so the uncut result can carry ties — entries
/// sharing an `a` with different `d` — that are not strictly monotone; see
/// `composition_buses_can_leave_non_monotone_ties_uncut` below.
#[must_use]
pub fn composition_buses(g: &Atf, f: &Atf) -> Option<Atf> {
    let mut buses = Vec::new();
    let mut j = 0usize;
    for fb in &f.buses {
        while j < g.buses.len() && g.buses[j].d < fb.a {
            j += 1;
        }
        if j < g.buses.len() {
            buses.push(cc_bus(fb, &g.buses[j]));
        }
    }
    if buses.is_empty() {
        return None;
    }
    Some(Atf::new(None, buses))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus(d: i64, a: i64) -> Bus {
        Bus::new(vec![1, 2], vec!["r".into()], d, a)
    }

    #[test]
    fn cut_is_idempotent() {
        let mut atf = Atf::new(None, vec![bus(0, 10), bus(5, 8), bus(6, 20)]);
        atf.cut();
        let once = atf.clone();
        atf.cut();
        assert_eq!(atf, once);
    }

    #[test]
    fn cut_drops_dominated_earlier_departure() {
        // b1.d < b2.d and b1.a >= b2.a: cut drops b1.
        let mut atf = Atf::new(None, vec![bus(0, 10), bus(5, 8)]);
        atf.cut();
        assert_eq!(atf.buses, vec![bus(5, 8)]);
    }

    #[test]
    fn cut_keeps_smaller_arrival_on_tie() {
        let mut atf = Atf::new(None, vec![bus(5, 12), bus(5, 8)]);
        atf.cut();
        assert_eq!(atf.buses, vec![bus(5, 8)]);
    }

    #[test]
    fn cut_keeps_monotone_sequence() {
        let mut atf = Atf::new(None, vec![bus(0, 10), bus(5, 12), bus(8, 20)]);
        atf.cut();
        assert_eq!(atf.buses, vec![bus(0, 10), bus(5, 12), bus(8, 20)]);
    }

    #[test]
    fn walk_only_arrival_is_t_plus_w() {
        let atf = Atf::new(Some(Walk::new(vec![1, 2], 15)), vec![]);
        let result = atf.arrival(0, 0, INFINITY);
        assert_eq!(result.time, 15);
        assert_eq!(result.route_names, vec!["walk".to_string()]);
    }

    #[test]
    fn bus_only_before_first_departure_returns_first_arrival() {
        let atf = Atf::new(None, vec![bus(5, 12), bus(10, 20)]);
        assert_eq!(atf.arrival(0, 0, INFINITY).time, 12);
    }

    #[test]
    fn bus_only_after_last_departure_is_unreachable() {
        let atf = Atf::new(None, vec![bus(5, 12)]);
        assert_eq!(atf.arrival(10, 0, INFINITY).time, INFINITY);
    }

    #[test]
    fn min_atf_picks_shorter_walk_and_merges_buses() {
        let f = Atf::new(Some(Walk::new(vec![1, 2], 25)), vec![bus(0, 10)]);
        let g = Atf::new(Some(Walk::new(vec![1, 2], 15)), vec![bus(5, 9)]);
        let merged = min_atf(&f, &g);
        assert_eq!(merged.walk.unwrap().w, 15);
        assert_eq!(merged.buses, vec![bus(0, 10), bus(5, 9)]);
    }

    #[test]
    fn min_atf_is_idempotent_on_self() {
        let mut f = Atf::new(None, vec![bus(0, 10), bus(5, 9)]);
        f.cut();
        let merged = min_atf(&f, &f);
        assert_eq!(merged.buses, f.buses);
    }

    #[test]
    fn composition_chains_two_bus_edges() {
        // u->m at (0,10),(5,12); m->v at (12,20). Expect shortcut u->v (0,20).
        let f = Atf::new(None, vec![Bus::new(vec![1, 2], vec!["r12".into()], 0, 10)]);
        let g = Atf::new(None, vec![Bus::new(vec![2, 3], vec!["r23".into()], 12, 20)]);
        let shortcut = composition(&g, &f, INFINITY).expect("non-empty composition");
        assert_eq!(shortcut.buses.len(), 1);
        let bus = &shortcut.buses[0];
        assert_eq!((bus.d, bus.a), (0, 20));
        assert_eq!(bus.nodes, vec![1, 2, 3]);
        assert_eq!(bus.route_names, vec!["r12".to_string(), "r23".to_string()]);
    }

    #[test]
    fn composition_picks_latest_feasible_predecessor_bus() {
        let f = Atf::new(
            None,
            vec![
                Bus::new(vec![1, 2], vec!["r1".into()], 0, 10),
                Bus::new(vec![1, 2], vec!["r1".into()], 5, 11),
            ],
        );
        let g = Atf::new(None, vec![Bus::new(vec![2, 3], vec!["r2".into()], 12, 20)]);
        let shortcut = composition(&g, &f, INFINITY).unwrap();
        // Both f-buses feed the same g-bus; only the later (d=5) survives as
        // the cc candidate before cut (cut then keeps the single entry).
        assert_eq!(shortcut.buses.len(), 1);
        assert_eq!(shortcut.buses[0].d, 5);
    }

    #[test]
    fn composition_is_empty_when_nothing_connects() {
        let f = Atf::new(None, vec![Bus::new(vec![1, 2], vec!["r".into()], 0, 10)]);
        let g = Atf::new(None, vec![Bus::new(vec![2, 3], vec!["r".into()], 5, 8)]);
        assert!(composition(&g, &f, INFINITY).is_none());
    }

    #[test]
    fn composition_buses_ignores_walk_legs() {
        let f = Atf::new(
            Some(Walk::new(vec![1, 2], 3)),
            vec![Bus::new(vec![1, 2], vec!["r1".into()], 0, 10)],
        );
        let g = Atf::new(
            Some(Walk::new(vec![2, 3], 3)),
            vec![Bus::new(vec![2, 3], vec!["r2".into()], 12, 20)],
        );
        let shortcut = composition_buses(&g, &f).unwrap();
        assert!(shortcut.walk.is_none());
        assert_eq!(shortcut.buses.len(), 1);
    }

    #[test]
    fn composition_buses_can_leave_non_monotone_ties_uncut() {
        // Two f-buses both arrive before g's only departure, so both map to
        // the same g-bus: the result carries (d=0,a=20) and (d=2,a=20), which
        // is not strictly monotone in `a`. `composition_buses` deliberately
        // does not `cut` its own output (the contraction loop's `min_atf`
        // against any pre-existing (p,q) edge performs the final `cut`; when
        // no such edge exists the raw composition is installed as-is, same
        // as the original). The duplicate-`a` tie is harmless at query time
        // — `arrival_bus` picks the first bus with `d >= t`, and either twin
        // reports the same `.a` — but it is a real, if inert, departure from
        // the documented monotonicity invariant.
        let f = Atf::new(
            None,
            vec![
                Bus::new(vec![1, 2], vec!["r1".into()], 0, 5),
                Bus::new(vec![1, 2], vec!["r1".into()], 2, 6),
            ],
        );
        let g = Atf::new(None, vec![Bus::new(vec![2, 3], vec!["r2".into()], 10, 20)]);
        let shortcut = composition_buses(&g, &f).unwrap();
        assert_eq!(shortcut.buses.len(), 2);
        assert_eq!(shortcut.buses[0].d, 0);
        assert_eq!(shortcut.buses[1].d, 2);
        assert_eq!(shortcut.buses[0].a, shortcut.buses[1].a);

        let mut cut_version = shortcut.clone();
        cut_version.cut();
        assert_eq!(cut_version.buses.len(), 1);
        assert_eq!(cut_version.buses[0].d, 2);
    }

    #[test]
    fn walk_budget_rejects_over_budget_path() {
        let f = Atf::new(Some(Walk::new(vec![1, 2], 5)), vec![]);
        let result = f.arrival(0, 3, 5);
        assert_eq!(result.time, INFINITY);
    }

    #[test]
    fn arrival_with_known_index_matches_plain_arrival() {
        let atf = Atf::new(None, vec![bus(0, 10), bus(5, 9)]);
        let start = atf.buses.partition_point(|b| b.d < 3);
        let via_index = atf.arrival_with_known_index(3, start, 0, INFINITY);
        let plain = atf.arrival(3, 0, INFINITY);
        assert_eq!(via_index.time, plain.time);
    }
}
