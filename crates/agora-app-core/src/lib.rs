// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for the Agora explorer (prefs, config, alerts,
//! render port, screen message port, cancellable timers).
//! Keeps the orbit/display/dispatch crates thin and surface-agnostic.

pub mod alert;
pub mod config;
pub mod message;
pub mod prefs;
pub mod render_port;
pub mod timer;

pub use alert::{Alert, AlertKind, AlertService};
pub use config::{ConfigError, ConfigService, ConfigStore, PREFS_KEY};
pub use message::{DisplayMessage, FeedError, ScreenSource, KIND_QUOTE};
pub use prefs::{
    DispatchPrefs, DisplayPrefs, ExplorerPrefs, HighlightPrefs, OrbitPrefs, ProcessingMode,
    RenderPrefs,
};
pub use render_port::{LiveParam, LiveParamObserver, RenderSurface};
pub use timer::TimerSlot;
