//! Integration tests for synced graphs and pruning

use modelcore_rs::graph::{GraphError, IdentityGraph, NodeKind, NodeTag, BASE_GRAPH};

#[test]
fn test_synced_graph_is_an_independent_snapshot() {
    let mut graph = IdentityGraph::new();
    let a = graph.add_node(NodeKind::Composite, &[NodeTag::Created]);
    let b = graph.add_node(NodeKind::Value, &[NodeTag::Created]);
    graph.add_edge(a, b, None, BASE_GRAPH).unwrap();

    graph.create_synced_graph("fit").unwrap();
    assert_eq!(graph.graph_names(), vec![BASE_GRAPH, "fit"]);
    assert!(matches!(
        graph.create_synced_graph("fit"),
        Err(GraphError::GraphExists { .. })
    ));

    // Later edits of the base graph do not leak into the snapshot
    let c = graph.add_node(NodeKind::Value, &[NodeTag::Created]);
    graph.add_edge(a, c, None, BASE_GRAPH).unwrap();
    assert_eq!(graph.edge_count(BASE_GRAPH).unwrap(), 2);
    assert_eq!(graph.edge_count("fit").unwrap(), 1);
    assert!(graph.get_item_in("fit", c).is_err());
    assert_eq!(graph.find_path(a, b, "fit").unwrap(), vec![a, b]);
}

#[test]
fn test_prune_removes_node_everywhere() {
    let mut graph = IdentityGraph::new();
    let a = graph.add_node(NodeKind::Composite, &[NodeTag::Created]);
    let b = graph.add_node(NodeKind::Value, &[NodeTag::Created]);
    let c = graph.add_node(NodeKind::Value, &[NodeTag::Created]);
    graph.add_edge(a, b, None, BASE_GRAPH).unwrap();
    graph.add_edge(b, c, None, BASE_GRAPH).unwrap();
    graph.create_synced_graph("copy").unwrap();

    assert!(graph.prune(b));
    assert!(!graph.prune(b));

    for name in [BASE_GRAPH, "copy"] {
        assert!(graph.get_item_in(name, b).is_err());
        assert!(graph
            .edges(name)
            .unwrap()
            .iter()
            .all(|(owner, owned, _)| *owner != b && *owned != b));
        assert_eq!(graph.node_count(name).unwrap(), 2);
    }
    assert!(graph.get_item_by_key(b).is_err());
}

#[test]
fn test_released_slot_gets_new_generation() {
    let mut graph = IdentityGraph::new();
    let a = graph.add_node(NodeKind::Value, &[NodeTag::Created]);
    graph.prune(a);
    let b = graph.add_node(NodeKind::Value, &[NodeTag::Created]);

    assert_eq!(a.index(), b.index());
    assert_ne!(a, b);
    assert!(!graph.contains(a));
    assert!(graph.contains(b));
}
