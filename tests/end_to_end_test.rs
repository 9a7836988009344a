use transit_ch::prelude::*;
use transit_ch::query::dijkstra::earliest_arrival;

fn bus_conn(from: i64, to: i64, d: i64, a: i64, route: &str) -> Connection {
    Connection {
        from_stop: from,
        to_stop: to,
        departure: d,
        arrival: a,
        route: route.to_string(),
    }
}

fn walk_conn(from: i64, to: i64, duration: i64) -> WalkConnection {
    WalkConnection {
        from_stop: from,
        to_stop: to,
        duration,
    }
}

#[test]
fn two_hop_bus_path_is_found() {
    let graph = TransportGraph::from_connections(
        vec![
            bus_conn(1, 2, 0, 10, "r12"),
            bus_conn(1, 2, 5, 12, "r12"),
            bus_conn(2, 3, 12, 20, "r23"),
        ],
        vec![],
    )
    .unwrap();

    let reference = earliest_arrival(&graph, 1, 3, 0, None);
    assert_eq!(reference.arrival, 20);
    assert_eq!(reference.path, vec![1, 2, 3]);
    assert_eq!(reference.routes, vec!["r12".to_string(), "r23".to_string()]);

    let contracted = ContractionBuilder::new(graph, None).contract().unwrap();
    let result = contracted.query(1, 3, 0, QueryOptions::default());
    assert_eq!(result.arrival, 20);
}

#[test]
fn dominated_walk_loses_to_bus_path() {
    let graph = TransportGraph::from_connections(
        vec![bus_conn(1, 2, 0, 10, "r12"), bus_conn(2, 3, 12, 20, "r23")],
        vec![walk_conn(1, 3, 25)],
    )
    .unwrap();

    let contracted = ContractionBuilder::new(graph, Some(i64::MAX / 4)).contract().unwrap();
    let result = contracted.query(1, 3, 0, QueryOptions::default());
    assert_eq!(result.arrival, 20);
}

#[test]
fn faster_walk_wins_over_bus_path() {
    let graph = TransportGraph::from_connections(
        vec![bus_conn(1, 2, 0, 10, "r12"), bus_conn(2, 3, 12, 20, "r23")],
        vec![walk_conn(1, 3, 15)],
    )
    .unwrap();

    let contracted = ContractionBuilder::new(graph, Some(i64::MAX / 4)).contract().unwrap();
    let result = contracted.query(1, 3, 0, QueryOptions::default());
    assert_eq!(result.arrival, 15);
    assert_eq!(result.path, vec![1, 3]);
    assert_eq!(result.routes, vec!["walk".to_string()]);
}

#[test]
fn dominated_earlier_departure_is_cut() {
    let graph = TransportGraph::from_connections(vec![bus_conn(1, 2, 0, 10, "r12"), bus_conn(1, 2, 5, 8, "r12")], vec![])
        .unwrap();

    let contracted = ContractionBuilder::new(graph, None).contract().unwrap();
    let result = contracted.query(1, 2, 0, QueryOptions::default());
    assert_eq!(result.arrival, 8);
}

#[test]
fn contracting_middle_node_preserves_shortcut_arrival() {
    let graph = TransportGraph::from_connections(
        vec![
            bus_conn(1, 2, 0, 10, "r12"),
            bus_conn(1, 2, 5, 12, "r12"),
            bus_conn(2, 3, 12, 20, "r23"),
        ],
        vec![],
    )
    .unwrap();

    let contracted = ContractionBuilder::new(graph, None).contract().unwrap();
    let result = contracted.query(1, 3, 0, QueryOptions::default());
    assert_eq!(result.arrival, 20);
}

#[test]
fn walk_budget_rejects_overlong_walk_path() {
    let graph = TransportGraph::from_connections(
        vec![bus_conn(2, 3, 100, 110, "r23")],
        vec![walk_conn(1, 2, 7)],
    )
    .unwrap();

    let contracted = ContractionBuilder::new(graph, Some(5)).contract().unwrap();
    let result = contracted.query(1, 3, 0, QueryOptions::default());
    assert_eq!(result.arrival, transit_ch::atf::INFINITY);
    assert!(result.path.is_empty());
}

#[test]
fn source_equals_target_is_immediate() {
    let graph = TransportGraph::from_connections(vec![bus_conn(1, 2, 0, 10, "r1")], vec![]).unwrap();
    let contracted = ContractionBuilder::new(graph, None).contract().unwrap();
    let result = contracted.query(1, 1, 42, QueryOptions::default());
    assert_eq!(result.arrival, 42);
    assert!(result.path == vec![1]);
}

#[test]
fn unreachable_target_reports_infinity() {
    let graph = TransportGraph::from_connections(
        vec![bus_conn(1, 2, 0, 10, "r1"), bus_conn(3, 4, 0, 10, "r2")],
        vec![],
    )
    .unwrap();
    let contracted = ContractionBuilder::new(graph, None).contract().unwrap();
    let result = contracted.query(1, 4, 0, QueryOptions::default());
    assert_eq!(result.arrival, transit_ch::atf::INFINITY);
    assert!(result.path.is_empty());
}

#[test]
fn fch_query_matches_reference_dijkstra_on_a_larger_network() {
    let transit = vec![
        bus_conn(1, 2, 0, 5, "a"),
        bus_conn(2, 3, 6, 14, "b"),
        bus_conn(1, 4, 1, 9, "c"),
        bus_conn(4, 3, 10, 18, "d"),
        bus_conn(3, 5, 20, 30, "e"),
        bus_conn(4, 5, 20, 25, "f"),
    ];

    let reference_graph = TransportGraph::from_connections(transit.clone(), vec![]).unwrap();
    let contraction_graph = TransportGraph::from_connections(transit, vec![]).unwrap();

    let reference = earliest_arrival(&reference_graph, 1, 5, 0, None);
    let contracted = ContractionBuilder::new(contraction_graph, None).contract().unwrap();
    let accelerated = contracted.query(1, 5, 0, QueryOptions::default());

    assert_eq!(accelerated.arrival, reference.arrival);
}
