// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pure orbit state machine.
//!
//! [`OrbitCore::apply`] is the single transition function: it consumes one
//! [`OrbitCommand`] plus a read view of the graph and the current time, and
//! returns the [`OrbitEffect`]s the driver must carry out. Nothing here
//! spawns, sleeps or touches the render surface.

use agora_app_core::OrbitPrefs;
use agora_graph::{GraphStore, NodeId};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use std::time::Duration;
use tokio::time::Instant;

/// Orbit session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitState {
    /// Camera is under user control.
    Inactive,
    /// Camera revolves around the focus node.
    Orbiting,
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum OrbitCommand {
    /// Begin orbiting, optionally around a specific node.
    Start(Option<NodeId>),
    /// Stop orbiting.
    Stop,
    /// Move the focus to `node`.
    Focus {
        /// New focus.
        node: NodeId,
        /// True for clicks: stop and jump; false for autonomous transitions.
        user_triggered: bool,
    },
    /// Periodic camera update.
    Tick,
    /// The one-shot "next transition" timer armed under `epoch` fired.
    TransitionTimerFired {
        /// Timer epoch captured when the timer was armed.
        epoch: u64,
    },
    /// Change the orbit radius (repositions immediately while orbiting).
    SetDistance(f32),
    /// Change the radians advanced per tick.
    SetAngularSpeed(f32),
    /// Change the camera height ratio.
    SetVerticalRatio(f32),
    /// Change the focus dwell time (seconds).
    SetFocusDuration(f32),
    /// Change the interpolation time for future transitions (seconds).
    SetTransitionDuration(f32),
    /// Forget the current focus (graph replaced).
    ResetFocus,
}

/// Work the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum OrbitEffect {
    /// Start the fixed-interval tick loop for session `epoch`.
    StartTicking {
        /// Session epoch the loop belongs to.
        epoch: u64,
        /// Tick period.
        interval: Duration,
    },
    /// Cancel the tick loop.
    StopTicking,
    /// Arm the one-shot transition timer.
    ArmTransitionTimer {
        /// Timer epoch to echo back in `TransitionTimerFired`.
        epoch: u64,
        /// Delay before firing.
        after: Duration,
    },
    /// Cancel the pending transition timer.
    CancelTransitionTimer,
    /// Write the camera pose.
    Camera {
        /// Camera position.
        position: Vec3,
        /// Point the camera looks at.
        look_at: Vec3,
        /// Surface-side smoothing (0 = jump).
        transition_ms: u64,
    },
    /// The focus changed autonomously (start or timer-driven transition).
    FocusChanged(NodeId),
}

/// Ease-in-out cubic over normalized progress `p` in `[0, 1]`.
pub fn ease_in_out_cubic(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 {
        4.0 * p * p * p
    } else {
        1.0 - (-2.0 * p + 2.0).powi(3) / 2.0
    }
}

/// Deterministic azimuth in `[0, TAU)` for `node`.
pub fn azimuth_for(node: &NodeId) -> f32 {
    let hash = blake3::hash(node.as_str().as_bytes());
    let b = hash.as_bytes();
    u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32 / (u32::MAX as f32 + 1.0)
        * std::f32::consts::TAU
}

/// Offset from the revolved point to the camera.
fn orbit_offset(angle: f32, distance: f32, vertical_ratio: f32) -> Vec3 {
    Vec3::new(
        distance * angle.sin(),
        distance * vertical_ratio,
        distance * angle.cos(),
    )
}

/// In-flight interpolation between two foci.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Last known position of the previous focus.
    pub from: Vec3,
    /// When the interpolation began.
    pub started: Instant,
    /// Duration captured at creation; later pref changes do not apply.
    pub duration: Duration,
}

impl Transition {
    /// Normalized progress at `now`.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (now.saturating_duration_since(self.started).as_secs_f32() / self.duration.as_secs_f32())
            .min(1.0)
    }
}

/// Orbit session data plus its transition function.
#[derive(Debug)]
pub struct OrbitCore {
    state: OrbitState,
    focus: Option<NodeId>,
    angle: f32,
    transition: Option<Transition>,
    prefs: OrbitPrefs,
    session_epoch: u64,
    timer_epoch: u64,
    rng: StdRng,
}

impl OrbitCore {
    /// Inactive core with entropy-seeded randomness.
    pub fn new(prefs: OrbitPrefs) -> Self {
        Self::with_rng(prefs, StdRng::from_entropy())
    }

    /// Inactive core with a fixed seed (reproducible focus choices).
    pub fn with_seed(prefs: OrbitPrefs, seed: u64) -> Self {
        Self::with_rng(prefs, StdRng::seed_from_u64(seed))
    }

    fn with_rng(prefs: OrbitPrefs, rng: StdRng) -> Self {
        Self {
            state: OrbitState::Inactive,
            focus: None,
            angle: 0.0,
            transition: None,
            prefs: prefs.sanitized(),
            session_epoch: 0,
            timer_epoch: 0,
            rng,
        }
    }

    /// Current state.
    pub fn state(&self) -> OrbitState {
        self.state
    }

    /// Current (or retained) focus.
    pub fn focus(&self) -> Option<&NodeId> {
        self.focus.as_ref()
    }

    /// Current orbit angle in radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// In-flight transition, if any.
    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Active parameters.
    pub fn prefs(&self) -> &OrbitPrefs {
        &self.prefs
    }

    /// Epoch of the current session (bumped on start and stop).
    pub fn session_epoch(&self) -> u64 {
        self.session_epoch
    }

    /// Epoch of the armed transition timer (bumped on every arm and on stop).
    pub fn timer_epoch(&self) -> u64 {
        self.timer_epoch
    }

    /// Apply one command.
    pub fn apply(&mut self, cmd: OrbitCommand, graph: &GraphStore, now: Instant) -> Vec<OrbitEffect> {
        let mut fx = Vec::new();
        match cmd {
            OrbitCommand::Start(node) => self.start(node, graph, now, &mut fx),
            OrbitCommand::Stop => self.stop(&mut fx),
            OrbitCommand::Focus {
                node,
                user_triggered: true,
            } => self.focus_user(node, graph, &mut fx),
            OrbitCommand::Focus {
                node,
                user_triggered: false,
            } => {
                if self.state == OrbitState::Orbiting {
                    self.focus_autonomous(node, graph, now, &mut fx);
                }
            }
            OrbitCommand::Tick => self.tick(graph, now, &mut fx),
            OrbitCommand::TransitionTimerFired { epoch } => {
                if self.state == OrbitState::Orbiting && epoch == self.timer_epoch {
                    self.transition_to_connected_node(graph, now, &mut fx);
                }
            }
            OrbitCommand::SetDistance(distance) => {
                self.prefs = OrbitPrefs {
                    distance,
                    ..self.prefs.clone()
                }
                .sanitized();
                self.reposition_at_live_target(graph, &mut fx);
            }
            OrbitCommand::SetAngularSpeed(speed) => {
                self.prefs = OrbitPrefs {
                    angular_speed: speed,
                    ..self.prefs.clone()
                }
                .sanitized();
            }
            OrbitCommand::SetVerticalRatio(ratio) => {
                self.prefs = OrbitPrefs {
                    vertical_ratio: ratio,
                    ..self.prefs.clone()
                }
                .sanitized();
            }
            OrbitCommand::SetFocusDuration(secs) => {
                self.prefs = OrbitPrefs {
                    focus_duration_secs: secs,
                    ..self.prefs.clone()
                }
                .sanitized();
            }
            OrbitCommand::SetTransitionDuration(secs) => {
                self.prefs = OrbitPrefs {
                    transition_duration_secs: secs,
                    ..self.prefs.clone()
                }
                .sanitized();
            }
            OrbitCommand::ResetFocus => {
                self.focus = None;
                self.transition = None;
            }
        }
        fx
    }

    fn start(&mut self, node: Option<NodeId>, graph: &GraphStore, now: Instant, fx: &mut Vec<OrbitEffect>) {
        if self.state == OrbitState::Orbiting {
            if let Some(node) = node {
                self.focus_autonomous(node, graph, now, fx);
            }
            return;
        }

        let requested = node.filter(|n| graph.contains(n));
        let retained = self.focus.clone().filter(|n| graph.contains(n));
        let chosen = match requested.or(retained) {
            Some(n) => n,
            None => match graph.node_ids().choose(&mut self.rng) {
                Some(n) => n.clone(),
                None => return,
            },
        };

        let changed = self.focus.as_ref() != Some(&chosen);
        self.focus = Some(chosen.clone());
        self.transition = None;
        self.state = OrbitState::Orbiting;
        self.session_epoch += 1;
        fx.push(OrbitEffect::StartTicking {
            epoch: self.session_epoch,
            interval: self.prefs.tick_interval(),
        });
        self.arm_timer(fx);
        if changed {
            fx.push(OrbitEffect::FocusChanged(chosen));
        }
    }

    fn stop(&mut self, fx: &mut Vec<OrbitEffect>) {
        if self.state == OrbitState::Inactive {
            return;
        }
        self.state = OrbitState::Inactive;
        self.transition = None;
        self.session_epoch += 1;
        self.timer_epoch += 1;
        fx.push(OrbitEffect::StopTicking);
        fx.push(OrbitEffect::CancelTransitionTimer);
    }

    fn focus_user(&mut self, node: NodeId, graph: &GraphStore, fx: &mut Vec<OrbitEffect>) {
        let Some(target) = graph.position(&node) else {
            return;
        };
        self.stop(fx);
        self.angle = azimuth_for(&node);
        self.focus = Some(node);
        fx.push(OrbitEffect::Camera {
            position: target + orbit_offset(self.angle, self.prefs.distance, self.prefs.vertical_ratio),
            look_at: target,
            transition_ms: 0,
        });
    }

    fn focus_autonomous(&mut self, node: NodeId, graph: &GraphStore, now: Instant, fx: &mut Vec<OrbitEffect>) {
        let Some(to) = graph.position(&node) else {
            return;
        };
        let from = self
            .focus
            .as_ref()
            .and_then(|prev| graph.position(prev))
            .unwrap_or(to);
        self.transition = Some(Transition {
            from,
            started: now,
            duration: self.prefs.transition_duration(),
        });
        self.focus = Some(node.clone());
        self.arm_timer(fx);
        fx.push(OrbitEffect::FocusChanged(node));
    }

    fn transition_to_connected_node(&mut self, graph: &GraphStore, now: Instant, fx: &mut Vec<OrbitEffect>) {
        let neighbor = self
            .focus
            .as_ref()
            .and_then(|f| graph.neighbors(f).choose(&mut self.rng))
            .cloned();
        let next = match neighbor {
            Some(n) => Some(n),
            None => graph.node_ids().choose(&mut self.rng).cloned(),
        };
        match next {
            Some(node) => self.focus_autonomous(node, graph, now, fx),
            // Empty graph: keep revolving, try again later.
            None => self.arm_timer(fx),
        }
    }

    fn tick(&mut self, graph: &GraphStore, now: Instant, fx: &mut Vec<OrbitEffect>) {
        if self.state != OrbitState::Orbiting {
            return;
        }
        self.angle = (self.angle + self.prefs.angular_speed).rem_euclid(std::f32::consts::TAU);
        let Some(target) = self.target_point(graph, now) else {
            return;
        };
        fx.push(OrbitEffect::Camera {
            position: target + orbit_offset(self.angle, self.prefs.distance, self.prefs.vertical_ratio),
            look_at: target,
            transition_ms: 0,
        });
    }

    /// Point the camera revolves around: interpolated during a transition,
    /// the live focus position otherwise.
    fn target_point(&mut self, graph: &GraphStore, now: Instant) -> Option<Vec3> {
        let live = graph.position(self.focus.as_ref()?)?;
        match self.transition {
            Some(t) => {
                let p = t.progress(now);
                if p >= 1.0 {
                    self.transition = None;
                    Some(live)
                } else {
                    Some(t.from.lerp(live, ease_in_out_cubic(p)))
                }
            }
            None => Some(live),
        }
    }

    fn reposition_at_live_target(&mut self, graph: &GraphStore, fx: &mut Vec<OrbitEffect>) {
        if self.state != OrbitState::Orbiting {
            return;
        }
        let Some(target) = self.focus.as_ref().and_then(|f| graph.position(f)) else {
            return;
        };
        fx.push(OrbitEffect::Camera {
            position: target + orbit_offset(self.angle, self.prefs.distance, self.prefs.vertical_ratio),
            look_at: target,
            transition_ms: 0,
        });
    }

    fn arm_timer(&mut self, fx: &mut Vec<OrbitEffect>) {
        self.timer_epoch += 1;
        fx.push(OrbitEffect::ArmTransitionTimer {
            epoch: self.timer_epoch,
            after: self.prefs.focus_duration(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_graph::{GraphData, GraphLink, NodeRecord};
    use approx::assert_relative_eq;

    fn placed(nodes: &[(&str, [f32; 3])], links: &[(&str, &str)]) -> GraphStore {
        GraphStore::from_data(GraphData {
            nodes: nodes
                .iter()
                .map(|(id, pos)| NodeRecord {
                    position: Some(*pos),
                    ..NodeRecord::bare(*id)
                })
                .collect(),
            links: links.iter().map(|(a, b)| GraphLink::new(*a, *b)).collect(),
        })
        .unwrap()
    }

    fn pair() -> GraphStore {
        placed(&[("a", [0.0; 3]), ("b", [100.0, 0.0, 0.0])], &[("a", "b")])
    }

    fn cameras(fx: &[OrbitEffect]) -> Vec<(Vec3, Vec3, u64)> {
        fx.iter()
            .filter_map(|e| match e {
                OrbitEffect::Camera {
                    position,
                    look_at,
                    transition_ms,
                } => Some((*position, *look_at, *transition_ms)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn easing_hits_endpoints_and_midpoint() {
        assert_relative_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_relative_eq!(ease_in_out_cubic(0.5), 0.5);
        assert_relative_eq!(ease_in_out_cubic(1.0), 1.0);
        assert_relative_eq!(ease_in_out_cubic(0.25), 0.0625);
        assert_relative_eq!(ease_in_out_cubic(0.75), 0.9375);
    }

    #[test]
    fn start_on_empty_graph_stays_inactive() {
        let mut core = OrbitCore::with_seed(OrbitPrefs::default(), 1);
        let fx = core.apply(OrbitCommand::Start(None), &GraphStore::new(), Instant::now());
        assert!(fx.is_empty());
        assert_eq!(core.state(), OrbitState::Inactive);
    }

    #[test]
    fn start_keeps_prior_focus() {
        let g = pair();
        let mut core = OrbitCore::with_seed(OrbitPrefs::default(), 1);
        let now = Instant::now();
        core.apply(OrbitCommand::Start(Some("b".into())), &g, now);
        core.apply(OrbitCommand::Stop, &g, now);
        let fx = core.apply(OrbitCommand::Start(None), &g, now);
        assert_eq!(core.focus(), Some(&NodeId::from("b")));
        assert!(fx.iter().any(|e| matches!(e, OrbitEffect::StartTicking { .. })));
        assert!(!fx.iter().any(|e| matches!(e, OrbitEffect::FocusChanged(_))));
    }

    #[test]
    fn tick_revolves_around_focus() {
        let g = pair();
        let prefs = OrbitPrefs {
            angular_speed: 0.5,
            distance: 10.0,
            vertical_ratio: 0.5,
            ..OrbitPrefs::default()
        };
        let mut core = OrbitCore::with_seed(prefs, 1);
        let now = Instant::now();
        core.apply(OrbitCommand::Start(Some("b".into())), &g, now);
        let cams = cameras(&core.apply(OrbitCommand::Tick, &g, now));
        let (pos, look, ms) = cams[0];
        assert_eq!(ms, 0);
        assert_eq!(look, Vec3::new(100.0, 0.0, 0.0));
        assert_relative_eq!(pos.x, 100.0 + 10.0 * 0.5f32.sin(), epsilon = 1e-4);
        assert_relative_eq!(pos.y, 5.0, epsilon = 1e-4);
        assert_relative_eq!(pos.z, 10.0 * 0.5f32.cos(), epsilon = 1e-4);
    }

    #[test]
    fn user_focus_stops_and_jumps() {
        let g = pair();
        let mut core = OrbitCore::with_seed(OrbitPrefs::default(), 1);
        let now = Instant::now();
        core.apply(OrbitCommand::Start(Some("a".into())), &g, now);
        let fx = core.apply(
            OrbitCommand::Focus {
                node: "b".into(),
                user_triggered: true,
            },
            &g,
            now,
        );
        assert_eq!(core.state(), OrbitState::Inactive);
        assert!(fx.contains(&OrbitEffect::StopTicking));
        assert!(fx.contains(&OrbitEffect::CancelTransitionTimer));
        let cams = cameras(&fx);
        assert_eq!(cams.len(), 1);
        assert_eq!(cams[0].2, 0);
        assert_eq!(cams[0].1, Vec3::new(100.0, 0.0, 0.0));
        assert!(!fx.iter().any(|e| matches!(e, OrbitEffect::ArmTransitionTimer { .. })));
    }

    #[test]
    fn user_focus_offset_is_deterministic() {
        let g = pair();
        let mut a = OrbitCore::with_seed(OrbitPrefs::default(), 1);
        let mut b = OrbitCore::with_seed(OrbitPrefs::default(), 99);
        let cmd = OrbitCommand::Focus {
            node: "b".into(),
            user_triggered: true,
        };
        let now = Instant::now();
        assert_eq!(cameras(&a.apply(cmd.clone(), &g, now)), cameras(&b.apply(cmd, &g, now)));
    }

    #[test]
    fn user_focus_on_missing_node_is_noop() {
        let g = pair();
        let mut core = OrbitCore::with_seed(OrbitPrefs::default(), 1);
        let now = Instant::now();
        core.apply(OrbitCommand::Start(Some("a".into())), &g, now);
        let fx = core.apply(
            OrbitCommand::Focus {
                node: "ghost".into(),
                user_triggered: true,
            },
            &g,
            now,
        );
        assert!(fx.is_empty());
        assert_eq!(core.state(), OrbitState::Orbiting);
    }

    #[test]
    fn timer_moves_to_neighbor_with_eased_interpolation() {
        let g = pair();
        let prefs = OrbitPrefs {
            angular_speed: 0.0,
            distance: 10.0,
            vertical_ratio: 0.0,
            transition_duration_secs: 2.0,
            ..OrbitPrefs::default()
        };
        let mut core = OrbitCore::with_seed(prefs, 3);
        let t0 = Instant::now();
        core.apply(OrbitCommand::Start(Some("a".into())), &g, t0);
        let epoch = core.timer_epoch();
        let fx = core.apply(OrbitCommand::TransitionTimerFired { epoch }, &g, t0);
        assert!(fx.contains(&OrbitEffect::FocusChanged("b".into())));
        assert!(fx.iter().any(|e| matches!(e, OrbitEffect::ArmTransitionTimer { .. })));

        let quarter = cameras(&core.apply(OrbitCommand::Tick, &g, t0 + Duration::from_millis(500)));
        assert_relative_eq!(quarter[0].1.x, 100.0 * ease_in_out_cubic(0.25), epsilon = 1e-3);

        let done = cameras(&core.apply(OrbitCommand::Tick, &g, t0 + Duration::from_secs(3)));
        assert_eq!(done[0].1, Vec3::new(100.0, 0.0, 0.0));
        assert!(core.transition().is_none());
    }

    #[test]
    fn stale_timer_is_ignored() {
        let g = pair();
        let mut core = OrbitCore::with_seed(OrbitPrefs::default(), 3);
        let now = Instant::now();
        core.apply(OrbitCommand::Start(Some("a".into())), &g, now);
        let stale = core.timer_epoch();
        core.apply(OrbitCommand::Stop, &g, now);
        core.apply(OrbitCommand::Start(None), &g, now);
        let fx = core.apply(OrbitCommand::TransitionTimerFired { epoch: stale }, &g, now);
        assert!(fx.is_empty());
        assert_eq!(core.focus(), Some(&NodeId::from("a")));
    }

    #[test]
    fn isolated_focus_jumps_anywhere() {
        let g = placed(&[("lonely", [0.0; 3]), ("x", [1.0, 0.0, 0.0])], &[]);
        let mut core = OrbitCore::with_seed(OrbitPrefs::default(), 5);
        let now = Instant::now();
        core.apply(OrbitCommand::Start(Some("lonely".into())), &g, now);
        let epoch = core.timer_epoch();
        let fx = core.apply(OrbitCommand::TransitionTimerFired { epoch }, &g, now);
        assert!(fx.iter().any(|e| matches!(e, OrbitEffect::FocusChanged(_))));
    }

    #[test]
    fn distance_change_repositions_at_live_target_without_touching_transition() {
        let g = pair();
        let prefs = OrbitPrefs {
            angular_speed: 0.0,
            vertical_ratio: 0.0,
            ..OrbitPrefs::default()
        };
        let mut core = OrbitCore::with_seed(prefs, 3);
        let now = Instant::now();
        core.apply(OrbitCommand::Start(Some("a".into())), &g, now);
        core.apply(
            OrbitCommand::Focus {
                node: "b".into(),
                user_triggered: false,
            },
            &g,
            now,
        );
        let before = *core.transition().unwrap();
        core.apply(OrbitCommand::SetTransitionDuration(9.0), &g, now);
        let cams = cameras(&core.apply(OrbitCommand::SetDistance(50.0), &g, now));
        assert_eq!(cams.len(), 1);
        assert_eq!(cams[0].1, Vec3::new(100.0, 0.0, 0.0));
        assert_relative_eq!(cams[0].0.distance(cams[0].1), 50.0, epsilon = 1e-3);
        assert_eq!(*core.transition().unwrap(), before);
    }

    #[test]
    fn distance_change_while_inactive_only_updates_prefs() {
        let g = pair();
        let mut core = OrbitCore::with_seed(OrbitPrefs::default(), 3);
        let fx = core.apply(OrbitCommand::SetDistance(-4.0), &g, Instant::now());
        assert!(fx.is_empty());
        assert_eq!(core.prefs().distance, OrbitPrefs::MIN_DISTANCE);
    }
}
