// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph store for the Agora explorer.
//!
//! Nodes are addressed by stable [`NodeId`]s; components hold ids, never
//! references, and re-resolve positions through the store on every use. The
//! store is built once per load/generation and replaced wholesale; the only
//! in-place mutation is position updates coming from the physics side.
//!
//! # Modules
//!
//! - [`highlight`] - multi-hop highlight propagation from a focus node
//! - [`generate`] - procedural graph generation (node count + density)
//! - [`layout`] - headless force layout that moves node positions

pub mod generate;
pub mod highlight;
pub mod layout;
mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use generate::{generate_graph, GenerationParams};
pub use highlight::{compute_highlight, Highlight, HighlightRadius, HighlightState};
pub use layout::ForceLayout;
pub use store::{GraphHandle, GraphNode, GraphStore};

/// Opaque, totally ordered node identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Order-independent key for an undirected link.
///
/// `LinkKey::new(a, b) == LinkKey::new(b, a)`; the smaller id is always `lo`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkKey {
    /// Smaller endpoint.
    pub lo: NodeId,
    /// Larger endpoint.
    pub hi: NodeId,
}

impl LinkKey {
    /// Build the canonical key for the pair.
    pub fn new(a: &NodeId, b: &NodeId) -> Self {
        if a <= b {
            Self {
                lo: a.clone(),
                hi: b.clone(),
            }
        } else {
            Self {
                lo: b.clone(),
                hi: a.clone(),
            }
        }
    }

    /// True when `id` is one of the endpoints.
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.lo == id || &self.hi == id
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lo, self.hi)
    }
}

/// Undirected link between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    /// Source endpoint (as supplied by the content source).
    pub source: NodeId,
    /// Target endpoint.
    pub target: NodeId,
}

impl GraphLink {
    /// Create a link.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Canonical dedupe key.
    pub fn key(&self) -> LinkKey {
        LinkKey::new(&self.source, &self.target)
    }
}

/// Quote content attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodePayload {
    /// Quote text.
    pub text: String,
    /// Author name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Thematic tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Node as delivered by a content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node identifier.
    pub id: NodeId,
    /// Optional quote payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<NodePayload>,
    /// Optional initial position; the origin until laid out when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 3]>,
}

impl NodeRecord {
    /// Bare node with no payload or position.
    pub fn bare(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            payload: None,
            position: None,
        }
    }
}

/// Wire shape of a graph (`{nodes, links}`), as produced by content sources.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphData {
    /// All nodes.
    pub nodes: Vec<NodeRecord>,
    /// All links; connection sets are derived from these.
    pub links: Vec<GraphLink>,
}

impl GraphData {
    /// Parse a JSON document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, GraphError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, GraphError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Errors raised while building a graph store.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Two nodes share the same id.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),
    /// A link names a node that does not exist.
    #[error("link {link} references missing node {missing}")]
    DanglingLink {
        /// The offending link.
        link: LinkKey,
        /// The endpoint that could not be resolved.
        missing: NodeId,
    },
    /// The JSON document could not be decoded.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
