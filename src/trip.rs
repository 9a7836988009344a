//! Elementary connection records: a single timetabled `Bus` leg and a
//! constant-duration `Walk` edge. Both carry the stop sequence and route
//! labels of the hop(s) they represent so that a query can report a full
//! itinerary, not just a travel time.

use serde::{Deserialize, Serialize};

use crate::atf::INFINITY;

/// One atomic bus leg: departs `d`, arrives `a` (`a > d` for a real leg).
///
/// `nodes` is the ordered sequence of underlying stop ids this leg (or, for
/// a synthetic shortcut bus, this composed path) passes through; length is
/// always >= 2. `route_names` is the matching sequence of route labels,
/// length >= 1.
///
/// `departure_walk`/`arrival_walk` are the cumulative walking time already
/// embedded before the first and after the last bus segment of this leg;
/// they are only meaningful when a `max_walk_duration` budget is active and
/// default to `0` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    pub d: i64,
    pub a: i64,
    pub nodes: Vec<i64>,
    pub route_names: Vec<String>,
    pub departure_walk: i64,
    pub arrival_walk: i64,
}

impl Bus {
    #[must_use]
    pub fn new(nodes: Vec<i64>, route_names: Vec<String>, d: i64, a: i64) -> Self {
        Self {
            d,
            a,
            nodes,
            route_names,
            departure_walk: 0,
            arrival_walk: 0,
        }
    }

    #[must_use]
    pub fn with_walk_accounting(mut self, departure_walk: i64, arrival_walk: i64) -> Self {
        self.departure_walk = departure_walk;
        self.arrival_walk = arrival_walk;
        self
    }
}

// Buses compare (and thus sort) by departure time only, matching the `cut`
// scan's expectation of an input sorted purely on `d`.
impl PartialOrd for Bus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.d.cmp(&other.d)
    }
}

/// A constant-time walking edge. `w = INFINITY` (via `Walk::absent`) is never
/// constructed directly; absence of a walk alternative is modelled as
/// `Option<Walk>` at the `Atf` level instead, per the port's design notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walk {
    pub w: i64,
    pub nodes: Vec<i64>,
    pub route_names: Vec<String>,
}

impl Walk {
    #[must_use]
    pub fn new(nodes: Vec<i64>, w: i64) -> Self {
        let route_names = vec!["walk".to_string(); nodes.len().saturating_sub(1)];
        Self { w, nodes, route_names }
    }

    /// Duration of this walk, or `INFINITY` as if it didn't exist — used by
    /// call sites that still want to do sentinel arithmetic on an
    /// `Option<Walk>` without matching first.
    #[must_use]
    pub fn duration_or_infinity(walk: &Option<Walk>) -> i64 {
        walk.as_ref().map_or(INFINITY, |w| w.w)
    }
}
