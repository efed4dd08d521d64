// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Procedural graph generation parameterized by node count and connection density.

use crate::{GraphData, GraphLink, NodeId, NodeRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Upper bound on generated node counts.
pub const MAX_GENERATED_NODES: usize = 5_000;

/// Inputs for [`generate_graph`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Number of nodes (clamped to `1..=MAX_GENERATED_NODES`).
    pub node_count: usize,
    /// Probability in `0..=1` that a node grows one extra random link.
    pub density: f32,
    /// RNG seed; identical params produce identical graphs.
    pub seed: u64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            node_count: 60,
            density: 0.3,
            seed: 0x5eed,
        }
    }
}

impl GenerationParams {
    /// Copy with every field forced into range.
    pub fn sanitized(self) -> Self {
        let density = if self.density.is_finite() {
            self.density.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            node_count: self.node_count.clamp(1, MAX_GENERATED_NODES),
            density,
            seed: self.seed,
        }
    }
}

/// Build a connected random graph.
///
/// Every node after the first attaches to a uniformly chosen earlier node
/// (a random spanning tree), then each node adds one extra link to a random
/// other node with probability `density`. Duplicates are left for the store
/// to collapse.
pub fn generate_graph(params: GenerationParams) -> GraphData {
    let params = params.sanitized();
    let mut rng = StdRng::seed_from_u64(params.seed);
    let n = params.node_count;

    let nodes: Vec<NodeRecord> = (0..n as u64).map(NodeRecord::bare).collect();
    let mut links = Vec::with_capacity(n * 2);

    for i in 1..n {
        let j = rng.gen_range(0..i);
        links.push(GraphLink::new(NodeId::from(i as u64), NodeId::from(j as u64)));
    }
    if n > 1 {
        for i in 0..n {
            if rng.gen_bool(f64::from(params.density)) {
                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                links.push(GraphLink::new(NodeId::from(i as u64), NodeId::from(j as u64)));
            }
        }
    }

    GraphData { nodes, links }
}
