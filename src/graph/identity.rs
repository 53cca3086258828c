//! Identity graph implementation backed by petgraph stable graphs.

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use petgraph::algo::astar;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;

use super::id::HandleAllocator;
use super::{GraphError, Id, Node, NodeKind, NodeTag, BASE_GRAPH};

type GraphResult<T> = Result<T, GraphError>;

/// One named ownership topology.
#[derive(Debug, Clone, Default)]
struct Topology {
    graph: StableDiGraph<Id, u32>,
    index: HashMap<Id, NodeIndex>,
}

impl Topology {
    fn insert(&mut self, id: Id) -> NodeIndex {
        if let Some(&ix) = self.index.get(&id) {
            return ix;
        }
        let ix = self.graph.add_node(id);
        self.index.insert(id, ix);
        ix
    }

    fn node(&self, id: Id) -> GraphResult<NodeIndex> {
        self.index
            .get(&id)
            .copied()
            .ok_or(GraphError::UnknownHandle { id })
    }

    fn remove(&mut self, id: Id) -> bool {
        match self.index.remove(&id) {
            Some(ix) => self.graph.remove_node(ix).is_some(),
            None => false,
        }
    }

    fn neighbors(&self, id: Id, direction: Direction) -> GraphResult<Vec<Id>> {
        let ix = self.node(id)?;
        let mut out: Vec<Id> = self
            .graph
            .neighbors_directed(ix, direction)
            .map(|n| self.graph[n])
            .collect();
        // petgraph yields neighbours newest first
        out.reverse();
        Ok(out)
    }
}

/// Registry of stable handles plus the ownership graphs between them.
///
/// The `"base"` graph always contains every live node. Synced graphs are
/// snapshots of the base graph taken by [`IdentityGraph::create_synced_graph`]
/// and evolve independently afterwards.
#[derive(Debug, Clone)]
pub struct IdentityGraph {
    allocator: HandleAllocator,
    nodes: HashMap<Id, Node>,
    graphs: IndexMap<String, Topology>,
}

impl Default for IdentityGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityGraph {
    /// Create an identity graph holding only the empty base graph.
    pub fn new() -> Self {
        let mut graphs = IndexMap::new();
        graphs.insert(BASE_GRAPH.to_string(), Topology::default());
        Self {
            allocator: HandleAllocator::default(),
            nodes: HashMap::new(),
            graphs,
        }
    }

    /// Register a new node in the base graph.
    ///
    /// # Arguments
    ///
    /// * `kind` - Whether the node stands for a value or a composite
    /// * `tags` - Initial tags of the node
    ///
    /// # Returns
    ///
    /// The handle of the new node. Released slots are reused with a new
    /// generation.
    pub fn add_node(&mut self, kind: NodeKind, tags: &[NodeTag]) -> Id {
        let handle = self.allocator.allocate();
        self.nodes.insert(
            handle,
            Node {
                handle,
                kind,
                tags: tags.iter().copied().collect(),
            },
        );
        if let Some(base) = self.graphs.get_mut(BASE_GRAPH) {
            base.insert(handle);
        }
        handle
    }

    /// Add (or re-weight) an ownership edge `owner -> owned`.
    ///
    /// # Arguments
    ///
    /// * `owner` - Owning node
    /// * `owned` - Owned node
    /// * `weight` - Explicit weight; defaults by the kind of `owned`
    /// * `graph` - Name of the graph to modify
    pub fn add_edge(
        &mut self,
        owner: Id,
        owned: Id,
        weight: Option<u32>,
        graph: &str,
    ) -> GraphResult<()> {
        let kind = self.get_item_by_key(owned)?.kind;
        let topology = self.topology(graph)?;
        let a = topology.node(owner)?;
        let b = topology.node(owned)?;
        let weight = weight.unwrap_or_else(|| kind.default_edge_weight());
        self.topology_mut(graph)?.graph.update_edge(a, b, weight);
        Ok(())
    }

    /// Remove the edge `owner -> owned`. Returns whether an edge was removed.
    pub fn remove_edge(&mut self, owner: Id, owned: Id, graph: &str) -> GraphResult<bool> {
        let topology = self.topology_mut(graph)?;
        let a = topology.node(owner)?;
        let b = topology.node(owned)?;
        Ok(match topology.graph.find_edge(a, b) {
            Some(edge) => topology.graph.remove_edge(edge).is_some(),
            None => false,
        })
    }

    /// Look up a live node by handle in the base graph.
    pub fn get_item_by_key(&self, id: Id) -> GraphResult<&Node> {
        self.nodes.get(&id).ok_or(GraphError::UnknownHandle { id })
    }

    /// Look up a node by handle in a named graph.
    pub fn get_item_in(&self, graph: &str, id: Id) -> GraphResult<&Node> {
        self.topology(graph)?.node(id)?;
        self.get_item_by_key(id)
    }

    /// Whether the handle refers to a live node.
    pub fn contains(&self, id: Id) -> bool {
        self.allocator.is_live(id) && self.nodes.contains_key(&id)
    }

    /// Shortest ownership path (in hops) from `a` to `b`.
    ///
    /// An unreachable target yields an empty path, not an error.
    pub fn find_path(&self, a: Id, b: Id, graph: &str) -> GraphResult<Vec<Id>> {
        let topology = self.topology(graph)?;
        let start = topology.node(a)?;
        let goal = topology.node(b)?;
        let path = astar(&topology.graph, start, |n| n == goal, |_| 1u32, |_| 0u32)
            .map(|(_, path)| path.into_iter().map(|ix| topology.graph[ix]).collect())
            .unwrap_or_default();
        Ok(path)
    }

    /// Walk backwards from `end` towards an owner.
    ///
    /// With a `start`, this is the path `start -> end` reversed. Without one,
    /// the longest backward path from `end` to a node without owners is
    /// returned. The result always begins with `end`.
    pub fn reverse_route(&self, end: Id, start: Option<Id>, graph: &str) -> GraphResult<Vec<Id>> {
        if let Some(start) = start {
            let mut path = self.find_path(start, end, graph)?;
            path.reverse();
            return Ok(path);
        }
        let topology = self.topology(graph)?;
        let origin = topology.node(end)?;

        let mut memo: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        let mut visiting: HashSet<NodeIndex> = HashSet::new();
        let best = Self::longest_backward(&topology.graph, origin, &mut memo, &mut visiting);
        Ok(best.into_iter().map(|ix| topology.graph[ix]).collect())
    }

    /// Longest owner chain starting at `current`, memoized per node.
    ///
    /// Owners are tried newest first; on equal length the first one wins.
    /// An owner already on the current chain is skipped.
    fn longest_backward(
        graph: &StableDiGraph<Id, u32>,
        current: NodeIndex,
        memo: &mut HashMap<NodeIndex, Vec<NodeIndex>>,
        visiting: &mut HashSet<NodeIndex>,
    ) -> Vec<NodeIndex> {
        if let Some(path) = memo.get(&current) {
            return path.clone();
        }
        visiting.insert(current);
        let mut owners: Vec<NodeIndex> = graph
            .neighbors_directed(current, Direction::Incoming)
            .filter(|n| !visiting.contains(n))
            .collect();
        owners.reverse();

        let mut tail: Vec<NodeIndex> = Vec::new();
        for owner in owners {
            let candidate = Self::longest_backward(graph, owner, memo, visiting);
            if candidate.len() > tail.len() {
                tail = candidate;
            }
        }
        visiting.remove(&current);

        let mut path = Vec::with_capacity(tail.len() + 1);
        path.push(current);
        path.extend(tail);
        memo.insert(current, path.clone());
        path
    }

    /// Remove a node from every graph and release its handle.
    ///
    /// # Returns
    ///
    /// `false` if the handle was already unknown.
    pub fn prune(&mut self, id: Id) -> bool {
        if !self.contains(id) {
            return false;
        }
        for topology in self.graphs.values_mut() {
            topology.remove(id);
        }
        self.nodes.remove(&id);
        self.allocator.release(id)
    }

    /// Snapshot the base graph under a new name.
    pub fn create_synced_graph(&mut self, name: &str) -> GraphResult<()> {
        if self.graphs.contains_key(name) {
            return Err(GraphError::GraphExists {
                name: name.to_string(),
            });
        }
        let snapshot = self.topology(BASE_GRAPH)?.clone();
        self.graphs.insert(name.to_string(), snapshot);
        Ok(())
    }

    /// Names of all graphs, base first.
    pub fn graph_names(&self) -> Vec<&str> {
        self.graphs.keys().map(String::as_str).collect()
    }

    /// Owned nodes of `owner`, in insertion order.
    pub fn children(&self, owner: Id, graph: &str) -> GraphResult<Vec<Id>> {
        self.topology(graph)?.neighbors(owner, Direction::Outgoing)
    }

    /// Owners of `owned`, in insertion order.
    pub fn parents(&self, owned: Id, graph: &str) -> GraphResult<Vec<Id>> {
        self.topology(graph)?.neighbors(owned, Direction::Incoming)
    }

    /// All edges of a graph as `(owner, owned, weight)`.
    pub fn edges(&self, graph: &str) -> GraphResult<Vec<(Id, Id, u32)>> {
        let topology = self.topology(graph)?;
        Ok(topology
            .graph
            .edge_references()
            .map(|e| (topology.graph[e.source()], topology.graph[e.target()], *e.weight()))
            .collect())
    }

    /// Weight of the edge `owner -> owned`, if present.
    pub fn edge_weight(&self, owner: Id, owned: Id, graph: &str) -> GraphResult<Option<u32>> {
        let topology = self.topology(graph)?;
        let a = topology.node(owner)?;
        let b = topology.node(owned)?;
        Ok(topology
            .graph
            .find_edge(a, b)
            .and_then(|e| topology.graph.edge_weight(e).copied()))
    }

    /// Number of nodes in a graph.
    pub fn node_count(&self, graph: &str) -> GraphResult<usize> {
        Ok(self.topology(graph)?.graph.node_count())
    }

    /// Number of edges in a graph.
    pub fn edge_count(&self, graph: &str) -> GraphResult<usize> {
        Ok(self.topology(graph)?.graph.edge_count())
    }

    /// Tags of a live node.
    pub fn tags(&self, id: Id) -> GraphResult<&BTreeSet<NodeTag>> {
        Ok(&self.get_item_by_key(id)?.tags)
    }

    /// Add a tag to a live node.
    pub fn add_tag(&mut self, id: Id, tag: NodeTag) -> GraphResult<()> {
        self.node_mut(id)?.tags.insert(tag);
        Ok(())
    }

    /// Replace every tag of a node with `tag`.
    pub fn reset_tags(&mut self, id: Id, tag: NodeTag) -> GraphResult<()> {
        let node = self.node_mut(id)?;
        node.tags.clear();
        node.tags.insert(tag);
        Ok(())
    }

    /// All live nodes carrying `tag`, sorted by handle.
    pub fn nodes_tagged(&self, tag: NodeTag) -> Vec<Id> {
        let mut out: Vec<Id> = self
            .nodes
            .values()
            .filter(|n| n.tags.contains(&tag))
            .map(|n| n.handle)
            .collect();
        out.sort();
        out
    }

    /// Every live handle, sorted.
    pub fn handles(&self) -> Vec<Id> {
        let mut out: Vec<Id> = self.nodes.keys().copied().collect();
        out.sort();
        out
    }

    fn node_mut(&mut self, id: Id) -> GraphResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(GraphError::UnknownHandle { id })
    }

    fn topology(&self, graph: &str) -> GraphResult<&Topology> {
        self.graphs.get(graph).ok_or_else(|| GraphError::GraphNotFound {
            name: graph.to_string(),
        })
    }

    fn topology_mut(&mut self, graph: &str) -> GraphResult<&mut Topology> {
        self.graphs
            .get_mut(graph)
            .ok_or_else(|| GraphError::GraphNotFound {
                name: graph.to_string(),
            })
    }
}
