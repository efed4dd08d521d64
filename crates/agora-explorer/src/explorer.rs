// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The orchestrator: owns the graph, selection, orbit, message overlay and
//! screen feed, and routes UI events to them.

use crate::error::ExplorerError;
use crate::event::ExplorerEvent;
use crate::source::GraphSource;
use agora_app_core::{
    Alert, AlertKind, AlertService, DisplayMessage, ExplorerPrefs, LiveParam, RenderPrefs,
    RenderSurface, ScreenSource,
};
use agora_dispatch::LexicalQuoteIndex;
use agora_display::{DisplayQueue, DisplaySurface, Enhancer, ScreenFeed};
use agora_graph::{GraphHandle, GraphStore, Highlight, HighlightRadius, HighlightState, NodeId};
use agora_orbit::{FocusListener, OrbitController, OrbitCore};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// How long a graph-load failure stays visible.
pub const LOAD_ALERT_TTL: Duration = Duration::from_secs(8);

/// Selection plus everything that reacts to it. Shared with the orbit as its
/// focus listener.
///
/// Surface and overlay writes happen under `state`, so a fence taken during a
/// graph load orders every selection write against the reset.
struct Selection {
    graph: GraphHandle,
    surface: Arc<dyn RenderSurface>,
    display: DisplayQueue,
    state: Mutex<SelectionState>,
}

struct SelectionState {
    highlight: HighlightState,
    /// Orbit notifications from sessions older than this are dropped.
    min_session: u64,
}

impl Selection {
    fn lock(&self) -> MutexGuard<'_, SelectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Select `node`, push its highlight and show its quote. False when the
    /// node is not in the graph or `session` is older than the fence.
    fn select(&self, node: &NodeId, interrupt: bool, session: u64) -> bool {
        let graph = self.graph.read();
        let Some(found) = graph.node(node) else {
            return false;
        };
        let quote = found.payload().map(DisplayMessage::from_payload);
        let mut state = self.lock();
        if session < state.min_session {
            debug!(%node, session, "focus change from an ended orbit session dropped");
            return false;
        }
        state.min_session = session;
        let highlight = state.highlight.set_focus(node.clone(), &graph);
        self.surface.set_highlight(Some(node), highlight);
        if let Some(quote) = quote {
            if interrupt {
                self.display.add_message_with_interrupt(quote);
            } else {
                self.display.enqueue(quote);
            }
        }
        true
    }

    fn clear(&self) {
        let mut state = self.lock();
        state.highlight.clear();
        self.surface.set_highlight(None, &Highlight::default());
    }

    /// Clear and refuse orbit notifications from sessions before `session`.
    fn fence(&self, session: u64) {
        let mut state = self.lock();
        state.min_session = state.min_session.max(session);
        state.highlight.clear();
        self.surface.set_highlight(None, &Highlight::default());
    }

    fn set_radius(&self, radius: HighlightRadius) {
        let graph = self.graph.read();
        let mut state = self.lock();
        state.highlight.set_radius(radius, &graph);
        if let Some(focus) = state.highlight.focus() {
            self.surface.set_highlight(Some(focus), state.highlight.highlight());
        }
    }

    fn focus(&self) -> Option<NodeId> {
        self.lock().highlight.focus().cloned()
    }

    fn highlight(&self) -> Highlight {
        self.lock().highlight.highlight().clone()
    }
}

impl FocusListener for Selection {
    fn on_focus_changed(&self, node: &NodeId, session: u64) {
        self.select(node, false, session);
    }
}

/// Interactive graph explorer.
pub struct Explorer {
    runtime: Handle,
    graph: GraphHandle,
    surface: Arc<dyn RenderSurface>,
    selection: Arc<Selection>,
    orbit: OrbitController,
    display: DisplayQueue,
    feed: Option<ScreenFeed>,
    quotes: Option<Arc<LexicalQuoteIndex>>,
    alerts: AlertService,
    prefs: ExplorerPrefs,
    disposed: bool,
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nodes = self.graph.read().len();
        f.debug_struct("Explorer")
            .field("nodes", &nodes)
            .field("selection", &self.selection.focus())
            .field("orbit", &self.orbit)
            .field("display", &self.display)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Explorer {
    /// Explorer over an empty graph.
    pub fn new(
        runtime: Handle,
        surface: Arc<dyn RenderSurface>,
        overlay: Arc<dyn DisplaySurface>,
        prefs: ExplorerPrefs,
    ) -> Self {
        let core = OrbitCore::new(prefs.orbit.clone());
        Self::build(runtime, surface, overlay, prefs, core)
    }

    /// Like [`Explorer::new`] with a fixed seed for the orbit's random choices.
    pub fn with_seed(
        runtime: Handle,
        surface: Arc<dyn RenderSurface>,
        overlay: Arc<dyn DisplaySurface>,
        prefs: ExplorerPrefs,
        seed: u64,
    ) -> Self {
        let core = OrbitCore::with_seed(prefs.orbit.clone(), seed);
        Self::build(runtime, surface, overlay, prefs, core)
    }

    fn build(
        runtime: Handle,
        surface: Arc<dyn RenderSurface>,
        overlay: Arc<dyn DisplaySurface>,
        prefs: ExplorerPrefs,
        core: OrbitCore,
    ) -> Self {
        let prefs = prefs.sanitized();
        let graph = GraphHandle::default();
        let display = DisplayQueue::new(runtime.clone(), overlay, prefs.display.clone());
        let orbit = OrbitController::from_core(runtime.clone(), graph.clone(), surface.clone(), core);
        let selection = Arc::new(Selection {
            graph: graph.clone(),
            surface: surface.clone(),
            display: display.clone(),
            state: Mutex::new(SelectionState {
                highlight: HighlightState::new(prefs.highlight.radius),
                min_session: 0,
            }),
        });
        orbit.set_focus_listener(Some(selection.clone()));
        Self {
            runtime,
            graph,
            surface,
            selection,
            orbit,
            display,
            feed: None,
            quotes: None,
            alerts: AlertService::default(),
            prefs,
            disposed: false,
        }
    }

    /// Rewrite messages through `enhancer` when `DisplayPrefs::enhance` is set.
    #[must_use]
    pub fn with_enhancer(mut self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.display = self.display.clone().with_enhancer(enhancer);
        self
    }

    /// Keep `index` in sync with every loaded graph.
    #[must_use]
    pub fn with_quote_index(mut self, index: Arc<LexicalQuoteIndex>) -> Self {
        index.rebuild(&self.graph.read());
        self.quotes = Some(index);
        self
    }

    /// Poll `source` for screen-channel messages; replaces any previous feed.
    pub fn attach_feed(&mut self, source: Arc<dyn ScreenSource>) {
        if self.disposed {
            return;
        }
        let interval = self.prefs.display.poll_interval();
        self.feed = Some(ScreenFeed::spawn(&self.runtime, source, self.display.clone(), interval));
        debug!(?interval, "screen feed attached");
    }

    /// Stop polling the screen channel.
    pub fn detach_feed(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.stop();
        }
    }

    /// True while a screen feed is polling.
    pub fn has_feed(&self) -> bool {
        self.feed.as_ref().is_some_and(ScreenFeed::is_running)
    }

    /// Replace the graph with whatever `source` delivers.
    ///
    /// On failure an error alert is raised and the current graph, selection,
    /// orbit and overlay are left exactly as they were.
    pub async fn load_graph(&mut self, source: &dyn GraphSource) -> Result<(), ExplorerError> {
        if self.disposed {
            return Err(ExplorerError::Disposed);
        }
        let fetched = source
            .fetch()
            .await
            .and_then(|data| GraphStore::from_data(data).map_err(ExplorerError::from));
        let store = match fetched {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "graph load failed; keeping the current graph");
                self.alerts.raise(
                    AlertKind::Error,
                    format!("Could not load graph: {err}"),
                    LOAD_ALERT_TTL,
                    Instant::now(),
                );
                return Err(err);
            }
        };

        self.orbit.stop();
        self.orbit.reset_focus();
        self.selection.fence(self.orbit.session_epoch());
        self.display.clear();
        let data = store.to_data();
        let nodes = store.len();
        self.graph.replace(store);
        self.surface.load_graph(&data);
        if let Some(index) = &self.quotes {
            index.rebuild(&self.graph.read());
        }
        info!(nodes, links = data.links.len(), "graph loaded");
        Ok(())
    }

    /// Apply one UI event. Ignored after [`Explorer::dispose`].
    pub fn handle_event(&mut self, event: ExplorerEvent) {
        if self.disposed {
            return;
        }
        debug!(?event, "explorer event");
        match event {
            ExplorerEvent::NodeClicked(node) => self.select_node(node),
            ExplorerEvent::BackgroundClicked => self.selection.clear(),
            ExplorerEvent::RadiusChanged(hops) => {
                let radius = HighlightRadius::new(hops);
                self.prefs.highlight.radius = radius;
                self.selection.set_radius(radius);
            }
            ExplorerEvent::ToggleOrbit => {
                if self.orbit.is_orbiting() {
                    self.orbit.stop();
                } else {
                    self.orbit.start(self.selection.focus());
                }
            }
            ExplorerEvent::DismissMessage => self.display.dismiss(),
            ExplorerEvent::OrbitDistance(v) => {
                self.orbit.set_orbit_distance(v);
                self.prefs.orbit = self.orbit.prefs();
            }
            ExplorerEvent::AngularSpeed(v) => {
                self.orbit.set_angular_speed(v);
                self.prefs.orbit = self.orbit.prefs();
            }
            ExplorerEvent::VerticalRatio(v) => {
                self.orbit.set_vertical_ratio(v);
                self.prefs.orbit = self.orbit.prefs();
            }
            ExplorerEvent::FocusDuration(v) => {
                self.orbit.set_focus_duration(v);
                self.prefs.orbit = self.orbit.prefs();
            }
            ExplorerEvent::TransitionDuration(v) => {
                self.orbit.set_transition_duration(v);
                self.prefs.orbit = self.orbit.prefs();
            }
            ExplorerEvent::NodeSize(v) => {
                self.prefs.render.node_size = v;
                self.push_render_param(|r| LiveParam::NodeSize(r.node_size));
            }
            ExplorerEvent::LinkDistance(v) => {
                self.prefs.render.link_distance = v;
                self.push_render_param(|r| LiveParam::LinkDistance(r.link_distance));
            }
            ExplorerEvent::LinkThickness(v) => {
                self.prefs.render.link_thickness = v;
                self.push_render_param(|r| LiveParam::LinkThickness(r.link_thickness));
            }
            ExplorerEvent::TypingSpeed(v) => {
                self.prefs.display.typing_speed = v;
                self.push_display_prefs();
            }
            ExplorerEvent::MessageDuration(v) => {
                self.prefs.display.message_duration_secs = v;
                self.push_display_prefs();
            }
        }
    }

    fn select_node(&mut self, node: NodeId) {
        if !self.graph.read().contains(&node) {
            debug!(%node, "click on unknown node ignored");
            return;
        }
        self.orbit.focus_on_node(node.clone(), true);
        self.selection.select(&node, true, self.orbit.session_epoch());
    }

    fn push_render_param(&mut self, param: impl FnOnce(&RenderPrefs) -> LiveParam) {
        self.prefs.render = self.prefs.render.sanitized();
        self.surface.on_live_param(param(&self.prefs.render));
    }

    fn push_display_prefs(&mut self) {
        self.prefs.display = self.prefs.display.clone().sanitized();
        self.display.set_prefs(self.prefs.display.clone());
    }

    /// Selected node, if any.
    pub fn selection(&self) -> Option<NodeId> {
        self.selection.focus()
    }

    /// Highlight of the current selection.
    pub fn highlight(&self) -> Highlight {
        self.selection.highlight()
    }

    /// Shared graph handle (positions may be written by a physics driver).
    pub fn graph(&self) -> &GraphHandle {
        &self.graph
    }

    /// The orbit controller.
    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    /// The message overlay queue.
    pub fn display(&self) -> &DisplayQueue {
        &self.display
    }

    /// Current preferences, as adjusted by events.
    pub fn prefs(&self) -> &ExplorerPrefs {
        &self.prefs
    }

    /// Alerts still visible now.
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.visible(Instant::now())
    }

    /// Dismiss an alert by id.
    pub fn dismiss_alert(&mut self, id: u64) -> bool {
        self.alerts.dismiss(id)
    }

    /// True once disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Stop every timer and task the explorer owns. Safe to call twice.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.detach_feed();
        self.orbit.dispose();
        self.display.dispose();
        self.selection.lock().highlight.clear();
        self.disposed = true;
        info!("explorer disposed");
    }
}

impl Drop for Explorer {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_dry_tests::{path_graph, RecordingDisplay, RecordingSurface};
    use agora_graph::GraphData;
    use async_trait::async_trait;

    struct Fixed(GraphData);

    #[async_trait]
    impl GraphSource for Fixed {
        async fn fetch(&self) -> Result<GraphData, ExplorerError> {
            Ok(self.0.clone())
        }
    }

    fn explorer() -> (Explorer, Arc<RecordingSurface>, Arc<RecordingDisplay>) {
        let surface = Arc::new(RecordingSurface::new());
        let overlay = Arc::new(RecordingDisplay::new());
        let explorer = Explorer::with_seed(
            Handle::current(),
            surface.clone(),
            overlay.clone(),
            ExplorerPrefs::default(),
            3,
        );
        (explorer, surface, overlay)
    }

    #[tokio::test(start_paused = true)]
    async fn late_orbit_focus_after_reload_is_dropped() {
        let (mut explorer, surface, overlay) = explorer();
        explorer.load_graph(&Fixed(path_graph(4))).await.unwrap();
        explorer.handle_event(ExplorerEvent::ToggleOrbit);
        let old_session = explorer.orbit().session_epoch();

        explorer.load_graph(&Fixed(path_graph(3))).await.unwrap();
        let calls = overlay.calls();
        // A transition timer that fired just before the reload reports late.
        explorer.selection.on_focus_changed(&NodeId::from("1"), old_session);

        assert_eq!(explorer.selection(), None);
        assert_eq!(surface.last_highlight().unwrap().focus, None);
        assert_eq!(explorer.display().queue_len(), 0);
        assert_eq!(explorer.display().phase(), agora_display::DisplayPhase::Idle);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(overlay.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn late_orbit_focus_never_overrides_a_click() {
        let (mut explorer, _surface, _overlay) = explorer();
        explorer.load_graph(&Fixed(path_graph(4))).await.unwrap();
        explorer.handle_event(ExplorerEvent::ToggleOrbit);
        let orbit_session = explorer.orbit().session_epoch();

        explorer.handle_event(ExplorerEvent::NodeClicked("3".into()));
        explorer.selection.on_focus_changed(&NodeId::from("0"), orbit_session);
        assert_eq!(explorer.selection(), Some(NodeId::from("3")));
    }

    #[tokio::test(start_paused = true)]
    async fn current_orbit_focus_is_applied() {
        let (mut explorer, _surface, _overlay) = explorer();
        explorer.load_graph(&Fixed(path_graph(4))).await.unwrap();
        explorer.handle_event(ExplorerEvent::ToggleOrbit);
        let session = explorer.orbit().session_epoch();
        explorer.selection.on_focus_changed(&NodeId::from("2"), session);
        assert_eq!(explorer.selection(), Some(NodeId::from("2")));
    }

    #[test]
    fn debug_reads_the_node_count() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let _guard = runtime.enter();
        let (explorer, _, _) = explorer();
        assert!(format!("{explorer:?}").contains("nodes: 0"));
    }
}
