// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! UI events accepted by [`crate::Explorer::handle_event`].

use agora_graph::NodeId;

/// Interaction or settings change coming from the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerEvent {
    /// A node was clicked: select it, jump the camera, show its quote.
    NodeClicked(NodeId),
    /// Empty space was clicked: drop the selection.
    BackgroundClicked,
    /// New highlight radius (clamped to `0..=5`).
    RadiusChanged(i64),
    /// Start or stop the orbit.
    ToggleOrbit,
    /// Dismiss the message currently on screen.
    DismissMessage,
    /// Orbit radius.
    OrbitDistance(f32),
    /// Orbit angular speed, radians per tick.
    AngularSpeed(f32),
    /// Camera height as a fraction of the orbit radius.
    VerticalRatio(f32),
    /// Seconds spent on each focus.
    FocusDuration(f32),
    /// Seconds spent moving between foci.
    TransitionDuration(f32),
    /// Node sphere size.
    NodeSize(f32),
    /// Preferred link length.
    LinkDistance(f32),
    /// Link line thickness.
    LinkThickness(f32),
    /// Characters typed per second.
    TypingSpeed(f32),
    /// Seconds a typed message stays before fading.
    MessageDuration(f32),
}
