// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless explorer: a logging render surface, a force-layout physics loop,
//! and the screen feed pulling straight from the dispatcher's slot.

use agora_app_core::{DisplayMessage, LiveParam, LiveParamObserver, RenderSurface};
use agora_display::DisplaySurface;
use agora_graph::{ForceLayout, GraphData, GraphHandle, Highlight, NodeId};
use glam::Vec3;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace};

/// Physics step period.
pub const PHYSICS_STEP: Duration = Duration::from_millis(16);

/// Render and overlay surface that only logs.
#[derive(Debug, Default)]
pub struct LogSurface {
    link_distance: Mutex<Option<f32>>,
}

impl LogSurface {
    /// Link length requested through live params, if any.
    pub fn link_distance(&self) -> Option<f32> {
        *self.link_distance.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LiveParamObserver for LogSurface {
    fn on_live_param(&self, param: LiveParam) {
        if let LiveParam::LinkDistance(d) = param {
            *self.link_distance.lock().unwrap_or_else(PoisonError::into_inner) = Some(d);
        }
        info!(?param, "live parameter");
    }
}

impl RenderSurface for LogSurface {
    fn load_graph(&self, graph: &GraphData) {
        info!(nodes = graph.nodes.len(), links = graph.links.len(), "scene loaded");
    }

    fn set_camera_position(&self, position: Vec3, look_at: Vec3, transition_ms: u64) {
        trace!(?position, ?look_at, transition_ms, "camera");
    }

    fn screen_coords_of(&self, _point: Vec3) -> Option<[f32; 2]> {
        None
    }

    fn set_highlight(&self, focus: Option<&NodeId>, highlight: &Highlight) {
        debug!(
            focus = focus.map(NodeId::as_str),
            nodes = highlight.nodes.len(),
            links = highlight.links.len(),
            "highlight"
        );
    }
}

impl DisplaySurface for LogSurface {
    fn show(&self, message: &DisplayMessage) {
        info!(
            kind = %message.kind,
            author = message.author.as_deref().unwrap_or("-"),
            text = %message.text,
            "on screen"
        );
    }

    fn reveal(&self, visible: &str) {
        trace!(chars = visible.chars().count(), "typing");
    }

    fn fade(&self, duration: Duration) {
        debug!(?duration, "fading");
    }

    fn remove(&self) {
        debug!("overlay removed");
    }
}

/// Step `layout` over `graph` until the task is aborted, following link
/// distance changes pushed to `surface`.
pub fn spawn_physics(
    graph: GraphHandle,
    layout: ForceLayout,
    surface: Arc<LogSurface>,
) -> JoinHandle<()> {
    tokio::spawn(physics_loop(graph, layout, surface))
}

#[instrument(skip_all)]
async fn physics_loop(graph: GraphHandle, mut layout: ForceLayout, surface: Arc<LogSurface>) {
    let mut ticker = tokio::time::interval(PHYSICS_STEP);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let dt = PHYSICS_STEP.as_secs_f32();
    loop {
        ticker.tick().await;
        if let Some(distance) = surface.link_distance() {
            layout.link_distance = distance;
        }
        layout.step(&graph, dt);
    }
}
