// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Multi-hop highlight propagation.
//!
//! `compute_highlight` is a pure function of (focus, radius, graph). Nodes at
//! hop distance `1..=radius` from the focus are highlighted; the focus itself
//! is never part of the node set. A link is highlighted when it joins the
//! focus to a highlighted node, or joins two highlighted nodes (regardless of
//! their hop distances).

use crate::{GraphStore, LinkKey, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Largest supported highlight radius (hops).
pub const MAX_HIGHLIGHT_RADIUS: u8 = 5;

/// Highlight radius clamped to `0..=MAX_HIGHLIGHT_RADIUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct HighlightRadius(u8);

impl HighlightRadius {
    /// No highlight at all.
    pub const ZERO: Self = Self(0);

    /// Clamp any integer into the valid range.
    pub fn new(hops: i64) -> Self {
        Self(hops.clamp(0, i64::from(MAX_HIGHLIGHT_RADIUS)) as u8)
    }

    /// Hop count.
    pub fn hops(self) -> u8 {
        self.0
    }
}

impl From<i64> for HighlightRadius {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<HighlightRadius> for u8 {
    fn from(value: HighlightRadius) -> Self {
        value.0
    }
}

/// Highlighted node ids and link keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight {
    /// Nodes within the radius (focus excluded).
    pub nodes: BTreeSet<NodeId>,
    /// Links inside the closure of focus and highlighted nodes.
    pub links: BTreeSet<LinkKey>,
}

impl Highlight {
    /// True when nothing is highlighted.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// Compute the highlight for `focus` at `radius`.
///
/// A focus missing from the graph yields an empty highlight.
pub fn compute_highlight(focus: &NodeId, radius: HighlightRadius, graph: &GraphStore) -> Highlight {
    let max_hops = radius.hops();
    if max_hops == 0 || !graph.contains(focus) {
        return Highlight::default();
    }

    let mut depth: HashMap<&NodeId, u8> = HashMap::new();
    let mut frontier = VecDeque::new();
    depth.insert(focus, 0);
    frontier.push_back(focus);

    while let Some(current) = frontier.pop_front() {
        let d = depth.get(current).copied().unwrap_or(0);
        if d >= max_hops {
            continue;
        }
        for next in graph.neighbors(current) {
            if !depth.contains_key(next) {
                depth.insert(next, d + 1);
                frontier.push_back(next);
            }
        }
    }

    let nodes: BTreeSet<NodeId> = depth
        .into_iter()
        .filter(|(_, d)| *d > 0)
        .map(|(id, _)| id.clone())
        .collect();

    let links = graph
        .links()
        .iter()
        .filter(|link| {
            let (s, t) = (&link.source, &link.target);
            (s == focus && nodes.contains(t))
                || (t == focus && nodes.contains(s))
                || (nodes.contains(s) && nodes.contains(t))
        })
        .map(crate::GraphLink::key)
        .collect();

    Highlight { nodes, links }
}

/// Current selection plus its computed highlight.
///
/// Recomputed on every focus or radius change; cleared when the selection is.
#[derive(Debug, Clone, Default)]
pub struct HighlightState {
    focus: Option<NodeId>,
    radius: HighlightRadius,
    current: Highlight,
}

impl HighlightState {
    /// Empty selection with the given radius.
    pub fn new(radius: HighlightRadius) -> Self {
        Self {
            focus: None,
            radius,
            current: Highlight::default(),
        }
    }

    /// Selected node, if any.
    pub fn focus(&self) -> Option<&NodeId> {
        self.focus.as_ref()
    }

    /// Active radius.
    pub fn radius(&self) -> HighlightRadius {
        self.radius
    }

    /// Last computed highlight.
    pub fn highlight(&self) -> &Highlight {
        &self.current
    }

    /// Select `focus` and recompute.
    pub fn set_focus(&mut self, focus: NodeId, graph: &GraphStore) -> &Highlight {
        self.focus = Some(focus);
        self.refresh(graph)
    }

    /// Change the radius and recompute for the current focus.
    pub fn set_radius(&mut self, radius: HighlightRadius, graph: &GraphStore) -> &Highlight {
        self.radius = radius;
        self.refresh(graph)
    }

    /// Recompute against `graph`.
    pub fn refresh(&mut self, graph: &GraphStore) -> &Highlight {
        self.current = match &self.focus {
            Some(focus) => compute_highlight(focus, self.radius, graph),
            None => Highlight::default(),
        };
        &self.current
    }

    /// Drop the selection and its highlight; the radius is kept.
    pub fn clear(&mut self) {
        self.focus = None;
        self.current = Highlight::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphData, GraphLink, NodeRecord};

    fn star() -> GraphStore {
        GraphStore::from_data(GraphData {
            nodes: ["hub", "a", "b", "c"].into_iter().map(NodeRecord::bare).collect(),
            links: vec![
                GraphLink::new("hub", "a"),
                GraphLink::new("hub", "b"),
                GraphLink::new("a", "b"),
                GraphLink::new("c", "a"),
            ],
        })
        .unwrap()
    }

    #[test]
    fn radius_clamps_out_of_range_values() {
        assert_eq!(HighlightRadius::new(-3).hops(), 0);
        assert_eq!(HighlightRadius::new(2).hops(), 2);
        assert_eq!(HighlightRadius::new(99).hops(), MAX_HIGHLIGHT_RADIUS);
    }

    #[test]
    fn radius_deserializes_with_clamping() {
        let r: HighlightRadius = serde_json::from_str("12").unwrap();
        assert_eq!(r.hops(), 5);
    }

    #[test]
    fn radius_zero_highlights_nothing() {
        let h = compute_highlight(&"hub".into(), HighlightRadius::ZERO, &star());
        assert!(h.is_empty());
    }

    #[test]
    fn links_between_neighbors_are_included() {
        let g = star();
        let h = compute_highlight(&"hub".into(), HighlightRadius::new(1), &g);
        assert_eq!(h.nodes, ["a", "b"].into_iter().map(NodeId::from).collect());
        assert!(h.links.contains(&LinkKey::new(&"a".into(), &"b".into())));
        assert!(!h.links.contains(&LinkKey::new(&"a".into(), &"c".into())));
    }

    #[test]
    fn missing_focus_yields_empty() {
        let h = compute_highlight(&"ghost".into(), HighlightRadius::new(3), &star());
        assert!(h.is_empty());
    }

    #[test]
    fn state_recomputes_and_clears() {
        let g = star();
        let mut state = HighlightState::new(HighlightRadius::new(1));
        assert_eq!(state.set_focus("c".into(), &g).nodes.len(), 1);
        assert_eq!(state.set_radius(HighlightRadius::new(2), &g).nodes.len(), 3);
        state.clear();
        assert!(state.highlight().is_empty());
        assert!(state.focus().is_none());
        assert_eq!(state.radius().hops(), 2);
    }
}
