// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Highlight propagation over path graphs and random graphs.

use agora_graph::{
    compute_highlight, generate_graph, GenerationParams, GraphData, GraphLink, GraphStore,
    HighlightRadius, LinkKey, NodeId, NodeRecord,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn path_graph(n: u64) -> GraphStore {
    GraphStore::from_data(GraphData {
        nodes: (0..n).map(NodeRecord::bare).collect(),
        links: (1..n).map(|i| GraphLink::new(i - 1, i)).collect(),
    })
    .expect("path graph")
}

fn ids(raw: &[u64]) -> BTreeSet<NodeId> {
    raw.iter().copied().map(NodeId::from).collect()
}

fn key(a: u64, b: u64) -> LinkKey {
    LinkKey::new(&NodeId::from(a), &NodeId::from(b))
}

#[test]
fn path_radius_one_reaches_direct_neighbors() {
    let g = path_graph(5);
    let h = compute_highlight(&NodeId::from(2), HighlightRadius::new(1), &g);
    assert_eq!(h.nodes, ids(&[1, 3]));
    assert_eq!(h.links, [key(1, 2), key(2, 3)].into_iter().collect());
}

#[test]
fn path_radius_two_reaches_both_ends() {
    let g = path_graph(5);
    let h = compute_highlight(&NodeId::from(2), HighlightRadius::new(2), &g);
    assert_eq!(h.nodes, ids(&[0, 1, 3, 4]));
    assert_eq!(h.links.len(), 4);
}

#[test]
fn saturates_at_eccentricity() {
    let g = path_graph(5);
    let at_four = compute_highlight(&NodeId::from(0), HighlightRadius::new(4), &g);
    let at_five = compute_highlight(&NodeId::from(0), HighlightRadius::new(5), &g);
    assert_eq!(at_four, at_five);
    assert_eq!(at_five.nodes.len(), 4);
}

#[test]
fn focus_never_in_node_set() {
    let g = path_graph(3);
    for r in 0..=5 {
        let h = compute_highlight(&NodeId::from(1), HighlightRadius::new(r), &g);
        assert!(!h.nodes.contains(&NodeId::from(1)));
    }
}

proptest! {
    #[test]
    fn highlight_is_monotonic_in_radius(
        node_count in 1usize..40,
        density in 0.0f32..1.0,
        seed in any::<u64>(),
        focus_pick in any::<usize>(),
        r1 in 0i64..=5,
        r2 in 0i64..=5,
    ) {
        let (lo, hi) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
        let g = GraphStore::from_data(generate_graph(GenerationParams { node_count, density, seed }))
            .expect("generated graph");
        let focus = g.node_ids().nth(focus_pick % g.len()).cloned().expect("focus");
        let small = compute_highlight(&focus, HighlightRadius::new(lo), &g);
        let large = compute_highlight(&focus, HighlightRadius::new(hi), &g);
        prop_assert!(small.nodes.is_subset(&large.nodes));
        prop_assert!(small.links.is_subset(&large.links));
        prop_assert_eq!(compute_highlight(&focus, HighlightRadius::new(hi), &g), large);
    }

    #[test]
    fn radius_zero_is_always_empty(seed in any::<u64>(), node_count in 1usize..30) {
        let g = GraphStore::from_data(generate_graph(GenerationParams { node_count, density: 0.5, seed }))
            .expect("generated graph");
        for focus in g.node_ids() {
            prop_assert!(compute_highlight(focus, HighlightRadius::ZERO, &g).is_empty());
        }
    }
}
