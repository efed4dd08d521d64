// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless force layout.
//!
//! Stands in for the render surface's physics when running without a browser:
//! pairwise repulsion plus spring links, velocities damped every step. Only
//! positions are written back; adjacency is never touched. Nodes loaded
//! without a position all start at the origin; coincident pairs are pushed
//! apart along a direction hashed from their ids.

use crate::{GraphHandle, NodeId};
use glam::Vec3;
use std::collections::HashMap;

/// Simple spring/repulsion simulation over a [`GraphHandle`].
#[derive(Debug, Clone)]
pub struct ForceLayout {
    /// Preferred link length.
    pub link_distance: f32,
    /// Repulsion strength between every node pair.
    pub charge: f32,
    /// Spring stiffness.
    pub spring: f32,
    /// Velocity retained per step.
    pub damping: f32,
    velocities: HashMap<NodeId, Vec3>,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self {
            link_distance: 140.0,
            charge: 2400.0,
            spring: 0.08,
            damping: 0.9,
            velocities: HashMap::new(),
        }
    }
}

impl ForceLayout {
    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, graph: &GraphHandle, dt: f32) {
        let updates = {
            let store = graph.read();
            let ids: Vec<&NodeId> = store.node_ids().collect();
            let n = ids.len();
            if n == 0 {
                self.velocities.clear();
                return;
            }
            let index: HashMap<&NodeId, usize> =
                ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
            let pos: Vec<Vec3> = store.nodes().map(|node| node.position()).collect();
            let mut forces = vec![Vec3::ZERO; n];

            for i in 0..n {
                for j in (i + 1)..n {
                    let delta = pos[i] - pos[j];
                    let dist2 = delta.length_squared().max(9.0);
                    let dir = delta
                        .try_normalize()
                        .unwrap_or_else(|| separation(ids[i], ids[j]));
                    let f = dir * (self.charge / dist2);
                    forces[i] += f;
                    forces[j] -= f;
                }
            }
            for link in store.links() {
                let (Some(&a), Some(&b)) = (index.get(&link.source), index.get(&link.target))
                else {
                    continue;
                };
                let delta = pos[b] - pos[a];
                let dist = delta.length().max(1.0);
                let f = (delta / dist) * ((dist - self.link_distance) * self.spring);
                forces[a] += f;
                forces[b] -= f;
            }

            self.velocities.retain(|id, _| index.contains_key(id));
            ids.iter()
                .enumerate()
                .map(|(i, id)| {
                    let vel = self.velocities.entry((*id).clone()).or_insert(Vec3::ZERO);
                    *vel = (*vel + forces[i] * dt) * self.damping;
                    ((*id).clone(), pos[i] + *vel * dt)
                })
                .collect::<Vec<_>>()
        };
        graph.set_positions(updates);
    }
}

/// Unit direction for a coincident pair, stable across steps.
fn separation(a: &NodeId, b: &NodeId) -> Vec3 {
    let mut h = blake3::Hasher::new();
    h.update(a.as_str().as_bytes());
    h.update(&[0]);
    h.update(b.as_str().as_bytes());
    let hash = h.finalize();
    let raw = hash.as_bytes();
    let unit = |i: usize| f32::from(i16::from_le_bytes([raw[i], raw[i + 1]])) / f32::from(i16::MAX);
    Vec3::new(unit(0), unit(2), unit(4))
        .try_normalize()
        .unwrap_or(Vec3::X)
}
