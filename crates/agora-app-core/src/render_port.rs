// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port to the physics/render surface.
//!
//! The surface owns the force simulation and the 3D scene; the explorer only
//! pushes graph data, camera poses, highlight sets and a handful of live
//! parameters. Implementations use interior mutability and are shared across
//! the orbit tick task and the orchestrator.

use agora_graph::{GraphData, Highlight, NodeId};
use glam::Vec3;

/// Render parameter that must reach the surface immediately when changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiveParam {
    /// Node sphere size.
    NodeSize(f32),
    /// Preferred link length of the force layout.
    LinkDistance(f32),
    /// Link line thickness.
    LinkThickness(f32),
}

/// Narrow observer for [`LiveParam`] changes.
pub trait LiveParamObserver: Send + Sync {
    /// Apply a parameter change.
    fn on_live_param(&self, param: LiveParam);
}

/// The physics/render surface.
pub trait RenderSurface: LiveParamObserver {
    /// (Re)initialize the scene with `graph`.
    fn load_graph(&self, graph: &GraphData);

    /// Move the camera to `position` looking at `look_at`, smoothing over
    /// `transition_ms` (0 = jump).
    fn set_camera_position(&self, position: Vec3, look_at: Vec3, transition_ms: u64);

    /// Project a world point to screen coordinates; `None` when off-screen.
    fn screen_coords_of(&self, point: Vec3) -> Option<[f32; 2]>;

    /// Show the selection and its highlight (`None` clears the selection styling).
    fn set_highlight(&self, focus: Option<&NodeId>, highlight: &Highlight);
}
