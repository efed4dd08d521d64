// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording fakes for the render surface and the message overlay.

use agora_app_core::{DisplayMessage, LiveParam, LiveParamObserver, RenderSurface};
use agora_display::DisplaySurface;
use agora_graph::{GraphData, Highlight, NodeId};
use glam::Vec3;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One `set_camera_position` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraWrite {
    /// Camera position.
    pub position: Vec3,
    /// Look-at point.
    pub look_at: Vec3,
    /// Requested smoothing.
    pub transition_ms: u64,
    /// Tokio time of the call (paused-clock friendly).
    pub at: Instant,
}

/// One `set_highlight` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightWrite {
    /// Selected node.
    pub focus: Option<NodeId>,
    /// Highlight sets.
    pub highlight: Highlight,
}

/// [`RenderSurface`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    cameras: Mutex<Vec<CameraWrite>>,
    highlights: Mutex<Vec<HighlightWrite>>,
    params: Mutex<Vec<LiveParam>>,
    loads: Mutex<Vec<GraphData>>,
}

impl RecordingSurface {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All camera writes so far.
    pub fn cameras(&self) -> Vec<CameraWrite> {
        lock(&self.cameras).clone()
    }

    /// Number of camera writes so far.
    pub fn camera_count(&self) -> usize {
        lock(&self.cameras).len()
    }

    /// Most recent camera write.
    pub fn last_camera(&self) -> Option<CameraWrite> {
        lock(&self.cameras).last().copied()
    }

    /// All highlight writes so far.
    pub fn highlights(&self) -> Vec<HighlightWrite> {
        lock(&self.highlights).clone()
    }

    /// Most recent highlight write.
    pub fn last_highlight(&self) -> Option<HighlightWrite> {
        lock(&self.highlights).last().cloned()
    }

    /// Live parameters pushed so far.
    pub fn live_params(&self) -> Vec<LiveParam> {
        lock(&self.params).clone()
    }

    /// Graphs loaded so far.
    pub fn loads(&self) -> Vec<GraphData> {
        lock(&self.loads).clone()
    }

    /// Forget everything recorded.
    pub fn reset(&self) {
        lock(&self.cameras).clear();
        lock(&self.highlights).clear();
        lock(&self.params).clear();
        lock(&self.loads).clear();
    }
}

impl LiveParamObserver for RecordingSurface {
    fn on_live_param(&self, param: LiveParam) {
        lock(&self.params).push(param);
    }
}

impl RenderSurface for RecordingSurface {
    fn load_graph(&self, graph: &GraphData) {
        lock(&self.loads).push(graph.clone());
    }

    fn set_camera_position(&self, position: Vec3, look_at: Vec3, transition_ms: u64) {
        lock(&self.cameras).push(CameraWrite {
            position,
            look_at,
            transition_ms,
            at: Instant::now(),
        });
    }

    fn screen_coords_of(&self, point: Vec3) -> Option<[f32; 2]> {
        Some([point.x, point.y])
    }

    fn set_highlight(&self, focus: Option<&NodeId>, highlight: &Highlight) {
        lock(&self.highlights).push(HighlightWrite {
            focus: focus.cloned(),
            highlight: highlight.clone(),
        });
    }
}

/// One overlay call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayCall {
    /// `show`
    Show(DisplayMessage),
    /// `reveal`
    Reveal(String),
    /// `fade`
    Fade(Duration),
    /// `remove`
    Remove,
}

/// [`DisplaySurface`] that records every call with its tokio time.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    calls: Mutex<Vec<(Instant, OverlayCall)>>,
}

impl RecordingDisplay {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls in order.
    pub fn calls(&self) -> Vec<OverlayCall> {
        lock(&self.calls).iter().map(|(_, c)| c.clone()).collect()
    }

    /// Calls with their timestamps.
    pub fn timed_calls(&self) -> Vec<(Instant, OverlayCall)> {
        lock(&self.calls).clone()
    }

    /// Texts passed to `show`, in order.
    pub fn shown(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|(_, c)| match c {
                OverlayCall::Show(m) => Some(m.text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `remove` calls.
    pub fn removals(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|(_, c)| *c == OverlayCall::Remove)
            .count()
    }

    /// Latest revealed prefix.
    pub fn last_reveal(&self) -> Option<String> {
        lock(&self.calls).iter().rev().find_map(|(_, c)| match c {
            OverlayCall::Reveal(t) => Some(t.clone()),
            _ => None,
        })
    }
}

impl DisplaySurface for RecordingDisplay {
    fn show(&self, message: &DisplayMessage) {
        lock(&self.calls).push((Instant::now(), OverlayCall::Show(message.clone())));
    }

    fn reveal(&self, visible: &str) {
        lock(&self.calls).push((Instant::now(), OverlayCall::Reveal(visible.to_owned())));
    }

    fn fade(&self, duration: Duration) {
        lock(&self.calls).push((Instant::now(), OverlayCall::Fade(duration)));
    }

    fn remove(&self) {
        lock(&self.calls).push((Instant::now(), OverlayCall::Remove));
    }
}
