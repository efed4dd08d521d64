// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Timer-driven orbit behaviour under a paused tokio clock.

use agora_app_core::OrbitPrefs;
use agora_dry_tests::{handle, path_graph, star_graph, RecordingSurface, PATH_SPACING};
use agora_graph::{GraphHandle, NodeId};
use agora_orbit::{FocusListener, OrbitController, OrbitCore, OrbitState};
use approx::assert_relative_eq;
use glam::Vec3;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;

fn controller(graph: GraphHandle, surface: &Arc<RecordingSurface>, prefs: OrbitPrefs) -> OrbitController {
    OrbitController::from_core(
        Handle::current(),
        graph,
        surface.clone(),
        OrbitCore::with_seed(prefs, 7),
    )
}

#[derive(Default)]
struct Foci(Mutex<Vec<(NodeId, u64)>>);

impl FocusListener for Foci {
    fn on_focus_changed(&self, node: &NodeId, session: u64) {
        self.0.lock().unwrap().push((node.clone(), session));
    }
}

impl Foci {
    fn seen(&self) -> Vec<NodeId> {
        self.0.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    fn sessions(&self) -> Vec<u64> {
        self.0.lock().unwrap().iter().map(|(_, s)| *s).collect()
    }
}

#[tokio::test(start_paused = true)]
async fn empty_graph_never_starts() {
    let surface = Arc::new(RecordingSurface::new());
    let orbit = controller(GraphHandle::default(), &surface, OrbitPrefs::default());
    orbit.start(None);
    assert_eq!(orbit.state(), OrbitState::Inactive);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(surface.camera_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn ticks_revolve_around_the_focus() {
    let surface = Arc::new(RecordingSurface::new());
    let orbit = controller(handle(path_graph(4)), &surface, OrbitPrefs::default());
    orbit.start(Some("2".into()));
    assert!(orbit.is_orbiting());

    tokio::time::sleep(Duration::from_millis(165)).await;
    let writes = surface.cameras();
    assert!((9..=10).contains(&writes.len()), "got {} writes", writes.len());
    let target = Vec3::new(2.0 * PATH_SPACING, 0.0, 0.0);
    for w in &writes {
        assert_eq!(w.look_at, target);
        assert_eq!(w.transition_ms, 0);
        let horizontal = Vec3::new(w.position.x - target.x, 0.0, w.position.z - target.z).length();
        assert_relative_eq!(horizontal, 300.0, epsilon = 1e-2);
        assert_relative_eq!(w.position.y, 90.0, epsilon = 1e-3);
    }
    assert_ne!(writes[0].position, writes[writes.len() - 1].position);
}

#[tokio::test(start_paused = true)]
async fn no_camera_write_after_stop() {
    let surface = Arc::new(RecordingSurface::new());
    let orbit = controller(handle(path_graph(4)), &surface, OrbitPrefs::default());
    orbit.start(None);
    tokio::time::sleep(Duration::from_millis(100)).await;
    orbit.stop();
    let after_stop = surface.camera_count();
    assert!(after_stop > 0);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(surface.camera_count(), after_stop);
    assert_eq!(orbit.state(), OrbitState::Inactive);
}

#[tokio::test(start_paused = true)]
async fn user_focus_stops_orbit_and_jumps_once() {
    let surface = Arc::new(RecordingSurface::new());
    let orbit = controller(handle(path_graph(5)), &surface, OrbitPrefs::default());
    orbit.start(Some("0".into()));
    tokio::time::sleep(Duration::from_millis(50)).await;

    orbit.focus_on_node("3".into(), true);
    assert_eq!(orbit.state(), OrbitState::Inactive);
    assert_eq!(orbit.focus(), Some(NodeId::from("3")));
    let jump = surface.last_camera().unwrap();
    assert_eq!(jump.transition_ms, 0);
    assert_eq!(jump.look_at, Vec3::new(3.0 * PATH_SPACING, 0.0, 0.0));

    let count = surface.camera_count();
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(surface.camera_count(), count);
}

#[tokio::test(start_paused = true)]
async fn timer_walks_to_connected_nodes() {
    let surface = Arc::new(RecordingSurface::new());
    let prefs = OrbitPrefs {
        focus_duration_secs: 1.0,
        transition_duration_secs: 0.5,
        ..OrbitPrefs::default()
    };
    let orbit = controller(handle(star_graph(3)), &surface, prefs);
    let foci = Arc::new(Foci::default());
    orbit.set_focus_listener(Some(foci.clone()));
    orbit.start(Some("0".into()));
    assert_eq!(foci.seen(), vec![NodeId::from("0")]);

    tokio::time::sleep(Duration::from_millis(1_050)).await;
    let seen = foci.seen();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[1], NodeId::from("0"));

    // A leaf's only neighbor is the hub.
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    let seen = foci.seen();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[2], NodeId::from("0"));
    assert!(orbit.is_orbiting());
}

#[tokio::test(start_paused = true)]
async fn focus_notifications_carry_their_session() {
    let surface = Arc::new(RecordingSurface::new());
    let prefs = OrbitPrefs {
        focus_duration_secs: 1.0,
        ..OrbitPrefs::default()
    };
    let orbit = controller(handle(star_graph(3)), &surface, prefs);
    let foci = Arc::new(Foci::default());
    orbit.set_focus_listener(Some(foci.clone()));

    orbit.start(Some("0".into()));
    let first = orbit.session_epoch();
    tokio::time::sleep(Duration::from_millis(1_050)).await;
    assert_eq!(foci.sessions(), vec![first, first]);

    orbit.stop();
    assert!(orbit.session_epoch() > first);
    orbit.start(Some("0".into()));
    let second = orbit.session_epoch();
    assert!(second > first);
    assert_eq!(foci.sessions().last(), Some(&second));
}

#[tokio::test(start_paused = true)]
async fn distance_change_repositions_immediately() {
    let surface = Arc::new(RecordingSurface::new());
    let orbit = controller(handle(path_graph(3)), &surface, OrbitPrefs::default());
    orbit.start(Some("1".into()));
    tokio::time::sleep(Duration::from_millis(40)).await;
    let before = surface.camera_count();

    orbit.set_orbit_distance(500.0);
    assert_eq!(surface.camera_count(), before + 1);
    let w = surface.last_camera().unwrap();
    let horizontal = Vec3::new(w.position.x - w.look_at.x, 0.0, w.position.z - w.look_at.z).length();
    assert_relative_eq!(horizontal, 500.0, epsilon = 1e-2);
    assert_eq!(orbit.prefs().distance, 500.0);
}

#[tokio::test(start_paused = true)]
async fn dispose_is_idempotent_and_final() {
    let surface = Arc::new(RecordingSurface::new());
    let orbit = controller(handle(path_graph(3)), &surface, OrbitPrefs::default());
    orbit.start(None);
    orbit.dispose();
    orbit.dispose();
    let count = surface.camera_count();
    orbit.start(None);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(surface.camera_count(), count);
    assert_eq!(orbit.state(), OrbitState::Inactive);
}
