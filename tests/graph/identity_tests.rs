//! Integration tests for node and edge handling of the identity graph

use modelcore_rs::graph::{
    GraphError, Id, IdentityGraph, NodeKind, NodeTag, BASE_GRAPH, COMPOSITE_EDGE_WEIGHT,
    VALUE_EDGE_WEIGHT,
};

fn chain(graph: &mut IdentityGraph) -> (Id, Id, Id) {
    let root = graph.add_node(NodeKind::Composite, &[NodeTag::Created]);
    let mid = graph.add_node(NodeKind::Composite, &[NodeTag::Created]);
    let leaf = graph.add_node(NodeKind::Value, &[NodeTag::Created]);
    graph.add_edge(root, mid, None, BASE_GRAPH).unwrap();
    graph.add_edge(mid, leaf, None, BASE_GRAPH).unwrap();
    (root, mid, leaf)
}

#[test]
fn test_default_edge_weights() {
    let mut graph = IdentityGraph::new();
    let (root, mid, leaf) = chain(&mut graph);

    assert_eq!(
        graph.edge_weight(root, mid, BASE_GRAPH).unwrap(),
        Some(COMPOSITE_EDGE_WEIGHT)
    );
    assert_eq!(
        graph.edge_weight(mid, leaf, BASE_GRAPH).unwrap(),
        Some(VALUE_EDGE_WEIGHT)
    );
    assert_eq!(graph.edge_weight(root, leaf, BASE_GRAPH).unwrap(), None);

    graph.add_edge(root, leaf, Some(3), BASE_GRAPH).unwrap();
    assert_eq!(graph.edge_weight(root, leaf, BASE_GRAPH).unwrap(), Some(3));
}

#[test]
fn test_paths() {
    let mut graph = IdentityGraph::new();
    let (root, mid, leaf) = chain(&mut graph);

    assert_eq!(
        graph.find_path(root, leaf, BASE_GRAPH).unwrap(),
        vec![root, mid, leaf]
    );
    // Edges are directed; the reverse direction is simply unreachable
    assert!(graph.find_path(leaf, root, BASE_GRAPH).unwrap().is_empty());

    assert_eq!(
        graph.reverse_route(leaf, None, BASE_GRAPH).unwrap(),
        vec![leaf, mid, root]
    );
    assert_eq!(
        graph.reverse_route(leaf, Some(mid), BASE_GRAPH).unwrap(),
        vec![leaf, mid]
    );
}

#[test]
fn test_reverse_route_prefers_longest_chain() {
    let mut graph = IdentityGraph::new();
    let (root, mid, leaf) = chain(&mut graph);
    let other = graph.add_node(NodeKind::Composite, &[NodeTag::Created]);
    graph.add_edge(other, leaf, None, BASE_GRAPH).unwrap();

    assert_eq!(
        graph.reverse_route(leaf, None, BASE_GRAPH).unwrap(),
        vec![leaf, mid, root]
    );
}

#[test]
fn test_lookup_errors() {
    let mut graph = IdentityGraph::new();
    let (root, _, leaf) = chain(&mut graph);

    let stale = Id::new(99, 0);
    assert_eq!(
        graph.get_item_by_key(stale).unwrap_err(),
        GraphError::UnknownHandle { id: stale }
    );
    assert!(matches!(
        graph.add_edge(root, leaf, None, "nowhere"),
        Err(GraphError::GraphNotFound { .. })
    ));
    assert!(matches!(
        graph.find_path(root, stale, BASE_GRAPH),
        Err(GraphError::UnknownHandle { .. })
    ));
}

#[test]
fn test_tags() {
    let mut graph = IdentityGraph::new();
    let (root, mid, leaf) = chain(&mut graph);

    graph.reset_tags(leaf, NodeTag::CreatedInternal).unwrap();
    graph.add_tag(mid, NodeTag::Returned).unwrap();

    assert_eq!(graph.nodes_tagged(NodeTag::Created), vec![root, mid]);
    assert_eq!(graph.nodes_tagged(NodeTag::CreatedInternal), vec![leaf]);
    assert!(graph.tags(mid).unwrap().contains(&NodeTag::Returned));
}

#[test]
fn test_handle_text_form() {
    let mut graph = IdentityGraph::new();
    let (root, _, _) = chain(&mut graph);
    let text = root.to_string();
    assert_eq!(text.parse::<Id>().unwrap(), root);
    assert!(matches!(
        "root".parse::<Id>(),
        Err(GraphError::InvalidHandle { .. })
    ));
}

#[test]
fn test_reverse_route_on_stacked_diamonds() {
    let mut graph = IdentityGraph::new();
    let leaf = graph.add_node(NodeKind::Value, &[NodeTag::Created]);
    let mut below = vec![leaf];
    for _ in 0..40 {
        let layer: Vec<Id> = (0..2)
            .map(|_| graph.add_node(NodeKind::Composite, &[NodeTag::Created]))
            .collect();
        for owner in &layer {
            for owned in &below {
                graph.add_edge(*owner, *owned, None, BASE_GRAPH).unwrap();
            }
        }
        below = layer;
    }

    let route = graph.reverse_route(leaf, None, BASE_GRAPH).unwrap();
    assert_eq!(route.len(), 41);
    assert_eq!(route[0], leaf);
    assert!(below.contains(&route[40]));
}
