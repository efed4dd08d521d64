// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory node arena with symmetric adjacency.

use crate::{GraphData, GraphError, GraphLink, LinkKey, NodeId, NodePayload, NodeRecord};
use glam::Vec3;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// A node in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    id: NodeId,
    position: Vec3,
    connections: BTreeSet<NodeId>,
    payload: Option<NodePayload>,
}

impl GraphNode {
    /// Node identifier.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Last position reported by the physics side.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Directly adjacent node ids.
    pub fn connections(&self) -> &BTreeSet<NodeId> {
        &self.connections
    }

    /// Quote payload, if any.
    pub fn payload(&self) -> Option<&NodePayload> {
        self.payload.as_ref()
    }
}

/// Arena of nodes plus the deduplicated link list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphStore {
    nodes: BTreeMap<NodeId, GraphNode>,
    links: Vec<GraphLink>,
}

impl GraphStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from wire data.
    ///
    /// Links are deduplicated by [`LinkKey`], self-links are dropped, and
    /// connection sets are derived from the surviving links so they are
    /// symmetric by construction.
    pub fn from_data(data: GraphData) -> Result<Self, GraphError> {
        let mut nodes = BTreeMap::new();
        for record in data.nodes {
            let NodeRecord {
                id,
                payload,
                position,
            } = record;
            if nodes.contains_key(&id) {
                return Err(GraphError::DuplicateNode(id));
            }
            let position = position.map_or(Vec3::ZERO, Vec3::from_array);
            nodes.insert(
                id.clone(),
                GraphNode {
                    id,
                    position,
                    connections: BTreeSet::new(),
                    payload,
                },
            );
        }

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for link in data.links {
            let key = link.key();
            for end in [&link.source, &link.target] {
                if !nodes.contains_key(end) {
                    return Err(GraphError::DanglingLink {
                        missing: end.clone(),
                        link: key,
                    });
                }
            }
            if link.source == link.target || !seen.insert(key) {
                continue;
            }
            if let Some(node) = nodes.get_mut(&link.source) {
                node.connections.insert(link.target.clone());
            }
            if let Some(node) = nodes.get_mut(&link.target) {
                node.connections.insert(link.source.clone());
            }
            links.push(link);
        }

        debug!(nodes = nodes.len(), links = links.len(), "graph store built");
        Ok(Self { nodes, links })
    }

    /// Export back to wire data (positions included).
    pub fn to_data(&self) -> GraphData {
        GraphData {
            nodes: self
                .nodes
                .values()
                .map(|n| NodeRecord {
                    id: n.id.clone(),
                    payload: n.payload.clone(),
                    position: Some(n.position.to_array()),
                })
                .collect(),
            links: self.links.clone(),
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the store has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lookup a node.
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// True when `id` is present.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes.keys()
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> + '_ {
        self.nodes.values()
    }

    /// Deduplicated links in insertion order.
    pub fn links(&self) -> &[GraphLink] {
        &self.links
    }

    /// Neighbors of `id`; empty when the node is missing.
    pub fn neighbors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|n| n.connections.iter())
    }

    /// Current position of `id`.
    pub fn position(&self, id: &NodeId) -> Option<Vec3> {
        self.nodes.get(id).map(|n| n.position)
    }

    /// Overwrite a node position. Returns false for unknown ids.
    pub fn set_position(&mut self, id: &NodeId, position: Vec3) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// True when the link `a`–`b` exists (either direction).
    pub fn has_link(&self, a: &NodeId, b: &NodeId) -> bool {
        self.nodes
            .get(a)
            .is_some_and(|n| n.connections.contains(b))
    }

    /// All link keys.
    pub fn link_keys(&self) -> impl Iterator<Item = LinkKey> + '_ {
        self.links.iter().map(GraphLink::key)
    }
}

/// Shared handle to the current graph.
///
/// Readers (highlight, orbit) take short read locks. Adjacency only changes
/// through [`GraphHandle::replace`]; the physics side only writes positions.
#[derive(Debug, Clone, Default)]
pub struct GraphHandle {
    inner: Arc<RwLock<GraphStore>>,
}

impl GraphHandle {
    /// Wrap a store.
    pub fn new(store: GraphStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Read access.
    pub fn read(&self) -> RwLockReadGuard<'_, GraphStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole graph.
    pub fn replace(&self, store: GraphStore) {
        *self.write() = store;
    }

    /// Apply position updates; unknown ids are skipped. Returns the number applied.
    pub fn set_positions<I>(&self, updates: I) -> usize
    where
        I: IntoIterator<Item = (NodeId, Vec3)>,
    {
        let mut store = self.write();
        updates
            .into_iter()
            .filter(|(id, pos)| store.set_position(id, *pos))
            .count()
    }

    /// Position of `id` in the current graph.
    pub fn position(&self, id: &NodeId) -> Option<Vec3> {
        self.read().position(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(nodes: &[&str], links: &[(&str, &str)]) -> GraphData {
        GraphData {
            nodes: nodes.iter().map(|n| NodeRecord::bare(*n)).collect(),
            links: links.iter().map(|(a, b)| GraphLink::new(*a, *b)).collect(),
        }
    }

    #[test]
    fn connections_are_symmetric() {
        let store = GraphStore::from_data(data(&["a", "b", "c"], &[("a", "b"), ("c", "b")])).unwrap();
        for node in store.nodes() {
            for other in node.connections() {
                assert!(store.has_link(other, node.id()));
            }
        }
        assert_eq!(store.neighbors(&"b".into()).count(), 2);
    }

    #[test]
    fn duplicate_and_reversed_links_collapse() {
        let store = GraphStore::from_data(data(
            &["a", "b"],
            &[("a", "b"), ("b", "a"), ("a", "b"), ("a", "a")],
        ))
        .unwrap();
        assert_eq!(store.links().len(), 1);
        assert!(store.node(&"a".into()).unwrap().connections().len() == 1);
    }

    #[test]
    fn duplicate_node_is_rejected() {
        let err = GraphStore::from_data(data(&["a", "a"], &[])).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode(id) if id.as_str() == "a"));
    }

    #[test]
    fn dangling_link_is_rejected() {
        let err = GraphStore::from_data(data(&["a"], &[("a", "zzz")])).unwrap_err();
        assert!(matches!(err, GraphError::DanglingLink { missing, .. } if missing.as_str() == "zzz"));
    }

    #[test]
    fn missing_position_defaults_to_origin() {
        let store = GraphStore::from_data(data(&["a", "b"], &[("a", "b")])).unwrap();
        assert_eq!(store.position(&"a".into()), Some(Vec3::ZERO));
        assert_eq!(store.position(&"b".into()), Some(Vec3::ZERO));
    }

    #[test]
    fn explicit_position_is_kept() {
        let mut d = data(&["a"], &[]);
        d.nodes[0].position = Some([1.0, 2.0, 3.0]);
        let store = GraphStore::from_data(d).unwrap();
        assert_eq!(store.position(&"a".into()), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn neighbors_of_missing_node_is_empty() {
        let store = GraphStore::new();
        assert_eq!(store.neighbors(&"nope".into()).count(), 0);
    }

    #[test]
    fn handle_position_updates_skip_unknown_ids() {
        let handle = GraphHandle::new(GraphStore::from_data(data(&["a"], &[])).unwrap());
        let applied = handle.set_positions([
            ("a".into(), Vec3::ONE),
            ("ghost".into(), Vec3::ZERO),
        ]);
        assert_eq!(applied, 1);
        assert_eq!(handle.position(&"a".into()), Some(Vec3::ONE));
    }

    #[test]
    fn link_key_is_order_independent() {
        let a = NodeId::from("10");
        let b = NodeId::from("9");
        assert_eq!(LinkKey::new(&a, &b), LinkKey::new(&b, &a));
        assert!(LinkKey::new(&a, &b).touches(&a));
    }
}
