//! # Identity Graph
//!
//! Every modeled value and composite object is registered as a node of the
//! identity graph and addressed by a stable [`Id`]. Ownership is recorded as
//! directed edges `owner -> owned` in a mandatory `"base"` graph; additional
//! named graphs can be taken as snapshots of the base graph.
//!
//! ```rust
//! use modelcore_rs::graph::{IdentityGraph, NodeKind, NodeTag, BASE_GRAPH};
//!
//! let mut graph = IdentityGraph::new();
//! let owner = graph.add_node(NodeKind::Composite, &[NodeTag::Created]);
//! let value = graph.add_node(NodeKind::Value, &[NodeTag::Created]);
//! graph.add_edge(owner, value, None, BASE_GRAPH).unwrap();
//!
//! assert_eq!(graph.find_path(owner, value, BASE_GRAPH).unwrap(), vec![owner, value]);
//! ```

pub mod id;
pub mod identity;

pub use id::Id;
pub use identity::IdentityGraph;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Name of the graph every node is registered in.
pub const BASE_GRAPH: &str = "base";

/// Default weight of an edge pointing at a value-bearing node.
pub const VALUE_EDGE_WEIGHT: u32 = 10;

/// Default weight of an edge pointing at a composite node.
pub const COMPOSITE_EDGE_WEIGHT: u32 = 1;

/// Errors raised by identity graph lookups
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown handle {id}")]
    UnknownHandle { id: Id },

    #[error("Graph '{name}' not found")]
    GraphNotFound { name: String },

    #[error("Graph '{name}' already exists")]
    GraphExists { name: String },

    #[error("'{text}' is not a valid handle")]
    InvalidHandle { text: String },
}

/// How an object entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeTag {
    /// Passed in as an argument to a composite.
    Argument,
    /// Created directly by the user.
    Created,
    /// Created and owned by a composite.
    CreatedInternal,
    /// Returned from an operation.
    Returned,
}

/// Shape of the object a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A value cell or parameter.
    Value,
    /// A composite owning other objects.
    Composite,
}

impl NodeKind {
    /// Weight used for edges pointing at a node of this kind.
    pub fn default_edge_weight(&self) -> u32 {
        match self {
            NodeKind::Value => VALUE_EDGE_WEIGHT,
            NodeKind::Composite => COMPOSITE_EDGE_WEIGHT,
        }
    }
}

/// A registered node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub handle: Id,
    pub kind: NodeKind,
    pub tags: BTreeSet<NodeTag>,
}
