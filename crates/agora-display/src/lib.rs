// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Display queue: typed-text presentation of one message at a time.
//!
//! # Modules
//!
//! - [`machine`] - pure state machine (`queued → typing → complete → fading → removed`)
//! - [`queue`] - tokio driver that owns the single timer
//! - [`port`] - overlay surface and enhancement ports
//! - [`feed`] - screen-channel poller
//! - [`http`] - reqwest-backed screen source and enhancer

pub mod feed;
pub mod http;
pub mod machine;
pub mod port;
pub mod queue;

pub use feed::ScreenFeed;
pub use http::{HttpEnhancer, HttpScreenSource, SCREEN_TEXT_PATH};
pub use machine::{DisplayEffect, DisplayEvent, DisplayMachine, DisplayPhase};
pub use port::{DisplaySurface, EnhanceError, Enhancer};
pub use queue::DisplayQueue;
