// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tokio driver for [`OrbitCore`].
//!
//! The driver owns two timer slots (the fixed-interval tick loop and the
//! one-shot transition timer) and performs camera writes while holding the
//! session lock. Spawned tasks only keep a `Weak` reference to the session,
//! so dropping the controller ends them.

use crate::core::{OrbitCommand, OrbitCore, OrbitEffect, OrbitState};
use agora_app_core::{OrbitPrefs, RenderSurface, TimerSlot};
use agora_graph::{GraphHandle, NodeId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, instrument, trace};

/// Notified after every autonomous focus change.
///
/// Notifications run outside the session lock, so one may arrive after the
/// session that produced it has ended. `session` is the epoch it came from;
/// compare it with [`OrbitController::session_epoch`] to discard late ones.
pub trait FocusListener: Send + Sync {
    /// The orbit session `session` moved its focus to `node` on its own.
    fn on_focus_changed(&self, node: &NodeId, session: u64);
}

struct Session {
    core: OrbitCore,
    ticker: TimerSlot,
    timer: TimerSlot,
    graph: GraphHandle,
    surface: Option<Arc<dyn RenderSurface>>,
    listener: Option<Arc<dyn FocusListener>>,
    disposed: bool,
}

struct Shared {
    runtime: Handle,
    session: Mutex<Session>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Camera automation around the current graph.
#[derive(Clone)]
pub struct OrbitController {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for OrbitController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.shared.lock();
        f.debug_struct("OrbitController")
            .field("state", &session.core.state())
            .field("focus", &session.core.focus())
            .field("disposed", &session.disposed)
            .finish()
    }
}

impl OrbitController {
    /// Controller with entropy-seeded focus choices.
    pub fn new(
        runtime: Handle,
        graph: GraphHandle,
        surface: Arc<dyn RenderSurface>,
        prefs: OrbitPrefs,
    ) -> Self {
        Self::from_core(runtime, graph, surface, OrbitCore::new(prefs))
    }

    /// Controller around an existing core (e.g. [`OrbitCore::with_seed`]).
    pub fn from_core(
        runtime: Handle,
        graph: GraphHandle,
        surface: Arc<dyn RenderSurface>,
        core: OrbitCore,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                runtime,
                session: Mutex::new(Session {
                    core,
                    ticker: TimerSlot::new(),
                    timer: TimerSlot::new(),
                    graph,
                    surface: Some(surface),
                    listener: None,
                    disposed: false,
                }),
            }),
        }
    }

    /// Install (or remove) the autonomous focus listener.
    pub fn set_focus_listener(&self, listener: Option<Arc<dyn FocusListener>>) {
        self.shared.lock().listener = listener;
    }

    /// Begin orbiting around `node`, the retained focus, or a random node.
    pub fn start(&self, node: Option<NodeId>) {
        dispatch(&self.shared, OrbitCommand::Start(node));
    }

    /// Stop orbiting. No camera write happens after this returns.
    pub fn stop(&self) {
        dispatch(&self.shared, OrbitCommand::Stop);
    }

    /// Move the focus. User-triggered moves stop the orbit and jump.
    pub fn focus_on_node(&self, node: NodeId, user_triggered: bool) {
        dispatch(
            &self.shared,
            OrbitCommand::Focus {
                node,
                user_triggered,
            },
        );
    }

    /// Orbit radius; repositions immediately while orbiting.
    pub fn set_orbit_distance(&self, distance: f32) {
        dispatch(&self.shared, OrbitCommand::SetDistance(distance));
    }

    /// Radians per tick, from the next tick on.
    pub fn set_angular_speed(&self, speed: f32) {
        dispatch(&self.shared, OrbitCommand::SetAngularSpeed(speed));
    }

    /// Camera height ratio, from the next tick on.
    pub fn set_vertical_ratio(&self, ratio: f32) {
        dispatch(&self.shared, OrbitCommand::SetVerticalRatio(ratio));
    }

    /// Focus dwell time in seconds, from the next armed timer on.
    pub fn set_focus_duration(&self, secs: f32) {
        dispatch(&self.shared, OrbitCommand::SetFocusDuration(secs));
    }

    /// Transition time in seconds, for transitions started after this call.
    pub fn set_transition_duration(&self, secs: f32) {
        dispatch(&self.shared, OrbitCommand::SetTransitionDuration(secs));
    }

    /// Forget the focus (the graph was replaced).
    pub fn reset_focus(&self) {
        dispatch(&self.shared, OrbitCommand::ResetFocus);
    }

    /// Current state.
    pub fn state(&self) -> OrbitState {
        self.shared.lock().core.state()
    }

    /// True while orbiting.
    pub fn is_orbiting(&self) -> bool {
        self.state() == OrbitState::Orbiting
    }

    /// Epoch of the current orbit session; bumped by every start and stop.
    pub fn session_epoch(&self) -> u64 {
        self.shared.lock().core.session_epoch()
    }

    /// Current or retained focus.
    pub fn focus(&self) -> Option<NodeId> {
        self.shared.lock().core.focus().cloned()
    }

    /// Active orbit parameters.
    pub fn prefs(&self) -> OrbitPrefs {
        self.shared.lock().core.prefs().clone()
    }

    /// Stop and release the surface and listener. Safe to call twice.
    pub fn dispose(&self) {
        let mut session = self.shared.lock();
        if session.disposed {
            return;
        }
        let session = &mut *session;
        let store = session.graph.read();
        session.core.apply(OrbitCommand::Stop, &store, Instant::now());
        drop(store);
        session.ticker.cancel();
        session.timer.cancel();
        session.surface = None;
        session.listener = None;
        session.disposed = true;
        debug!("orbit controller disposed");
    }
}

/// Apply `cmd` under the lock, then notify the listener outside it.
fn dispatch(shared: &Arc<Shared>, cmd: OrbitCommand) {
    let notify = {
        let mut guard = shared.lock();
        if guard.disposed {
            return;
        }
        let session = &mut *guard;
        let store = session.graph.read();
        let effects = session.core.apply(cmd, &store, Instant::now());
        drop(store);
        run_effects(shared, session, effects)
    };
    if let Some((listener, node, session)) = notify {
        listener.on_focus_changed(&node, session);
    }
}

fn run_effects(
    shared: &Arc<Shared>,
    session: &mut Session,
    effects: Vec<OrbitEffect>,
) -> Option<(Arc<dyn FocusListener>, NodeId, u64)> {
    let mut changed = None;
    for effect in effects {
        match effect {
            OrbitEffect::StartTicking { epoch, interval } => {
                debug!(epoch, ?interval, "orbit tick loop started");
                session
                    .ticker
                    .arm(&shared.runtime, tick_loop(Arc::downgrade(shared), epoch, interval));
            }
            OrbitEffect::StopTicking => session.ticker.cancel(),
            OrbitEffect::ArmTransitionTimer { epoch, after } => {
                let weak = Arc::downgrade(shared);
                session.timer.arm(&shared.runtime, async move {
                    tokio::time::sleep(after).await;
                    if let Some(shared) = weak.upgrade() {
                        dispatch(&shared, OrbitCommand::TransitionTimerFired { epoch });
                    }
                });
            }
            OrbitEffect::CancelTransitionTimer => session.timer.cancel(),
            OrbitEffect::Camera {
                position,
                look_at,
                transition_ms,
            } => {
                if let Some(surface) = &session.surface {
                    surface.set_camera_position(position, look_at, transition_ms);
                }
            }
            OrbitEffect::FocusChanged(node) => {
                debug!(%node, "orbit focus changed");
                changed = Some(node);
            }
        }
    }
    let listener = session.listener.clone()?;
    let epoch = session.core.session_epoch();
    changed.map(|node| (listener, node, epoch))
}

#[instrument(skip(shared, interval))]
async fn tick_loop(shared: Weak<Shared>, epoch: u64, interval: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let mut guard = shared.lock();
        let session = &mut *guard;
        if session.disposed
            || session.core.state() != OrbitState::Orbiting
            || session.core.session_epoch() != epoch
        {
            trace!("stale tick loop exits");
            return;
        }
        let store = session.graph.read();
        let effects = session.core.apply(OrbitCommand::Tick, &store, Instant::now());
        drop(store);
        // Ticks only ever produce camera writes.
        let _ = run_effects(&shared, session, effects);
    }
}
