// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Explorer preferences (orbit, display, highlight, dispatch, live render params).
//!
//! Every numeric field has a valid range; [`ExplorerPrefs::sanitized`] clamps
//! into it instead of failing.

use agora_graph::HighlightRadius;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Convert seconds to a `Duration`, treating non-finite or negative input as zero.
pub fn secs(value: f32) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f32(value)
    } else {
        Duration::ZERO
    }
}

fn clamp_f32(value: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}

/// Saved preferences for the explorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExplorerPrefs {
    /// Camera orbit parameters.
    pub orbit: OrbitPrefs,
    /// Message overlay parameters.
    pub display: DisplayPrefs,
    /// Highlight radius.
    pub highlight: HighlightPrefs,
    /// Dual-channel processing modes.
    pub dispatch: DispatchPrefs,
    /// Parameters pushed live to the render surface.
    pub render: RenderPrefs,
}

impl ExplorerPrefs {
    /// Copy with every field forced into range.
    pub fn sanitized(self) -> Self {
        Self {
            orbit: self.orbit.sanitized(),
            display: self.display.sanitized(),
            highlight: self.highlight,
            dispatch: self.dispatch.sanitized(),
            render: self.render.sanitized(),
        }
    }
}

/// Orbit camera parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitPrefs {
    /// Radius of the orbit circle.
    pub distance: f32,
    /// Camera height as a fraction of `distance`.
    pub vertical_ratio: f32,
    /// Radians advanced per tick.
    pub angular_speed: f32,
    /// Seconds spent on a focus before moving to a connected node.
    pub focus_duration_secs: f32,
    /// Seconds the interpolation between two foci takes.
    pub transition_duration_secs: f32,
    /// Tick period in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for OrbitPrefs {
    fn default() -> Self {
        Self {
            distance: 300.0,
            vertical_ratio: 0.3,
            angular_speed: 0.003,
            focus_duration_secs: 8.0,
            transition_duration_secs: 2.0,
            tick_interval_ms: 16,
        }
    }
}

impl OrbitPrefs {
    /// Smallest orbit radius.
    pub const MIN_DISTANCE: f32 = 10.0;
    /// Largest orbit radius.
    pub const MAX_DISTANCE: f32 = 5_000.0;

    /// Copy with every field forced into range.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            distance: clamp_f32(self.distance, Self::MIN_DISTANCE, Self::MAX_DISTANCE, d.distance),
            vertical_ratio: clamp_f32(self.vertical_ratio, -2.0, 2.0, d.vertical_ratio),
            angular_speed: clamp_f32(self.angular_speed, -0.5, 0.5, d.angular_speed),
            focus_duration_secs: clamp_f32(self.focus_duration_secs, 0.5, 600.0, d.focus_duration_secs),
            transition_duration_secs: clamp_f32(
                self.transition_duration_secs,
                0.0,
                60.0,
                d.transition_duration_secs,
            ),
            tick_interval_ms: self.tick_interval_ms.clamp(1, 1_000),
        }
    }

    /// Focus dwell time.
    pub fn focus_duration(&self) -> Duration {
        secs(self.focus_duration_secs)
    }

    /// Transition interpolation time.
    pub fn transition_duration(&self) -> Duration {
        secs(self.transition_duration_secs)
    }

    /// Tick period.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Message overlay parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPrefs {
    /// Characters revealed per second.
    pub typing_speed: f32,
    /// Seconds a fully typed message stays before fading.
    pub message_duration_secs: f32,
    /// Delay before the first character, in ms.
    pub pre_delay_ms: u64,
    /// Fade-out duration, in ms.
    pub fade_ms: u64,
    /// Run text through the enhancement endpoint before typing.
    pub enhance: bool,
    /// Give up on enhancement after this many ms.
    pub enhance_timeout_ms: u64,
    /// Screen feed poll period, in ms.
    pub poll_interval_ms: u64,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            typing_speed: 30.0,
            message_duration_secs: 6.0,
            pre_delay_ms: 300,
            fade_ms: 800,
            enhance: false,
            enhance_timeout_ms: 5_000,
            poll_interval_ms: 1_000,
        }
    }
}

impl DisplayPrefs {
    /// Copy with every field forced into range.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            typing_speed: clamp_f32(self.typing_speed, 1.0, 1_000.0, d.typing_speed),
            message_duration_secs: clamp_f32(
                self.message_duration_secs,
                0.0,
                600.0,
                d.message_duration_secs,
            ),
            pre_delay_ms: self.pre_delay_ms.min(10_000),
            fade_ms: self.fade_ms.min(10_000),
            enhance: self.enhance,
            enhance_timeout_ms: self.enhance_timeout_ms.clamp(1, 60_000),
            poll_interval_ms: self.poll_interval_ms.clamp(50, 60_000),
        }
    }

    /// Delay between two revealed characters (`1000 / typing_speed` ms).
    pub fn char_delay(&self) -> Duration {
        let speed = if self.typing_speed.is_finite() {
            self.typing_speed.max(1.0)
        } else {
            Self::default().typing_speed
        };
        Duration::from_micros((1_000_000.0 / f64::from(speed)).round() as u64)
    }

    /// Dwell time of a completed message.
    pub fn message_duration(&self) -> Duration {
        secs(self.message_duration_secs)
    }

    /// Pre-typing delay.
    pub fn pre_delay(&self) -> Duration {
        Duration::from_millis(self.pre_delay_ms)
    }

    /// Fade-out time.
    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    /// Enhancement timeout.
    pub fn enhance_timeout(&self) -> Duration {
        Duration::from_millis(self.enhance_timeout_ms)
    }

    /// Feed poll period.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Highlight parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightPrefs {
    /// Hop radius (clamped to 0..=5 on deserialize).
    pub radius: HighlightRadius,
}

impl Default for HighlightPrefs {
    fn default() -> Self {
        Self {
            radius: HighlightRadius::new(1),
        }
    }
}

/// Processing mode for one dispatcher channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProcessingMode {
    /// Return the input unchanged.
    #[default]
    #[serde(rename = "echo")]
    PassThrough,
    /// Generate text with the local model.
    #[serde(rename = "llm")]
    LocalGeneration,
    /// Find the most similar stored quote.
    #[serde(rename = "quote")]
    SimilarityLookup,
    /// Find a similar quote, then generate from it.
    #[serde(rename = "rag")]
    LookupThenGenerate,
}

impl ProcessingMode {
    /// Every mode, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::PassThrough,
        Self::LocalGeneration,
        Self::SimilarityLookup,
        Self::LookupThenGenerate,
    ];

    /// Wire name (`echo`, `llm`, `quote`, `rag`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PassThrough => "echo",
            Self::LocalGeneration => "llm",
            Self::SimilarityLookup => "quote",
            Self::LookupThenGenerate => "rag",
        }
    }

    /// True for modes that call the text generator.
    pub fn uses_generation(self) -> bool {
        matches!(self, Self::LocalGeneration | Self::LookupThenGenerate)
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown processing mode: {s}"))
    }
}

/// Dual-channel dispatch parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchPrefs {
    /// Mode for the immediately returned user response.
    pub user_mode: ProcessingMode,
    /// Mode for the asynchronously displayed screen text.
    pub screen_mode: ProcessingMode,
    /// Per-job generation timeout in seconds.
    pub generation_timeout_secs: f32,
    /// Text generation endpoint (Ollama-compatible).
    pub generator_endpoint: String,
    /// Generation model name.
    pub generator_model: String,
    /// Prompt template; `{message}` is replaced by the input.
    pub prompt_template: String,
}

impl Default for DispatchPrefs {
    fn default() -> Self {
        Self {
            user_mode: ProcessingMode::PassThrough,
            screen_mode: ProcessingMode::PassThrough,
            generation_timeout_secs: 30.0,
            generator_endpoint: "http://localhost:11434".into(),
            generator_model: "llama3.2:1b".into(),
            prompt_template: "Write a haiku inspired by the following message: \"{message}\". \
                              Return only the haiku."
                .into(),
        }
    }
}

impl DispatchPrefs {
    /// Copy with every field forced into range.
    pub fn sanitized(self) -> Self {
        Self {
            generation_timeout_secs: clamp_f32(self.generation_timeout_secs, 1.0, 600.0, 30.0),
            ..self
        }
    }

    /// Generation timeout.
    pub fn generation_timeout(&self) -> Duration {
        secs(self.generation_timeout_secs)
    }
}

/// Parameters propagated live to the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPrefs {
    /// Node sphere size.
    pub node_size: f32,
    /// Preferred link length for the force layout.
    pub link_distance: f32,
    /// Link line thickness.
    pub link_thickness: f32,
}

impl Default for RenderPrefs {
    fn default() -> Self {
        Self {
            node_size: 4.0,
            link_distance: 140.0,
            link_thickness: 0.5,
        }
    }
}

impl RenderPrefs {
    /// Copy with every field forced into range.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            node_size: clamp_f32(self.node_size, 0.1, 100.0, d.node_size),
            link_distance: clamp_f32(self.link_distance, 1.0, 2_000.0, d.link_distance),
            link_thickness: clamp_f32(self.link_thickness, 0.0, 20.0, d.link_thickness),
        }
    }
}
