// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Small graphs with known shape and positions.

use agora_graph::{GraphData, GraphHandle, GraphLink, GraphStore, NodePayload, NodeRecord};

/// Spacing between consecutive nodes of [`path_graph`] on the x axis.
pub const PATH_SPACING: f32 = 100.0;

/// `0 - 1 - ... - (n-1)` laid out on the x axis, each node carrying a quote
/// `"quote {i}"` by `"author {i}"`.
pub fn path_graph(n: usize) -> GraphData {
    let nodes = (0..n)
        .map(|i| NodeRecord {
            payload: Some(NodePayload {
                text: format!("quote {i}"),
                author: Some(format!("author {i}")),
                tags: Vec::new(),
            }),
            position: Some([i as f32 * PATH_SPACING, 0.0, 0.0]),
            ..NodeRecord::bare(i.to_string())
        })
        .collect();
    let links = (1..n)
        .map(|i| GraphLink::new((i - 1).to_string(), i.to_string()))
        .collect();
    GraphData { nodes, links }
}

/// `0` in the middle connected to `1..=k`.
pub fn star_graph(k: usize) -> GraphData {
    let nodes = (0..=k)
        .map(|i| NodeRecord {
            position: Some([i as f32 * PATH_SPACING, 0.0, 0.0]),
            ..NodeRecord::bare(i.to_string())
        })
        .collect();
    let links = (1..=k).map(|i| GraphLink::new("0", i.to_string())).collect();
    GraphData { nodes, links }
}

/// Shared handle over `data`.
///
/// # Panics
/// When `data` is not a valid graph; fixtures always are.
#[allow(clippy::expect_used)]
pub fn handle(data: GraphData) -> GraphHandle {
    GraphHandle::new(GraphStore::from_data(data).expect("fixture graph is valid"))
}
