// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ports the display queue renders through and calls out to.

use agora_app_core::DisplayMessage;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Message overlay on the render surface.
///
/// Calls arrive in lifecycle order for each message: `show`, zero or more
/// `reveal`, then either `fade` followed by `remove`, or `remove` alone on a
/// hard clear.
pub trait DisplaySurface: Send + Sync {
    /// Create the overlay for `message` with no characters visible.
    fn show(&self, message: &DisplayMessage);
    /// Set the visible prefix of the live message.
    fn reveal(&self, visible: &str);
    /// Begin fading out over `duration`.
    fn fade(&self, duration: Duration);
    /// Remove the overlay.
    fn remove(&self);
}

/// Enhancement call failure.
#[derive(Debug, Error)]
pub enum EnhanceError {
    /// The endpoint could not be reached or answered with an error status.
    #[error("enhancement endpoint failed: {0}")]
    Transport(String),
    /// The endpoint answered with something unusable.
    #[error("unusable enhancement response: {0}")]
    Response(String),
}

/// Optional rewrite step run before a message starts typing.
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Rewrite `text`.
    async fn enhance(&self, text: &str) -> Result<String, EnhanceError>;
}
