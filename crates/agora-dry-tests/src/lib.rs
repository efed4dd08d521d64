// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Agora crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`surface`] - Recording render surface and message overlay
//! - [`text`] - Scripted generator, quote lookup and enhancer
//! - [`fixtures`] - Path and star graphs with known positions

pub mod config;
pub mod fixtures;
pub mod surface;
pub mod text;

pub use config::InMemoryConfigStore;
pub use fixtures::{handle, path_graph, star_graph, PATH_SPACING};
pub use surface::{CameraWrite, HighlightWrite, OverlayCall, RecordingDisplay, RecordingSurface};
pub use text::{CountingLookup, ScriptedEnhancer, ScriptedGenerator};
