// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! On-screen message wire type and the port the screen feed polls.

use agora_graph::NodePayload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message kind used for quotes shown on node selection.
pub const KIND_QUOTE: &str = "quote";

/// A message for the on-screen overlay.
///
/// Serialized as `{"text": .., "type": .., "author": ..}`; `author` is
/// omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    /// Text to type out.
    pub text: String,
    /// Producer tag (`echo`, `llm`, `quote`, `rag`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Attribution line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl DisplayMessage {
    /// Message without attribution.
    pub fn new(text: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: kind.into(),
            author: None,
        }
    }

    /// Attach an author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Quote message built from a node payload.
    pub fn from_payload(payload: &NodePayload) -> Self {
        Self {
            text: payload.text.clone(),
            kind: KIND_QUOTE.into(),
            author: payload.author.clone(),
        }
    }
}

/// Failure while polling a [`ScreenSource`].
#[derive(Debug, Error)]
pub enum FeedError {
    /// The source could not be reached.
    #[error("screen source unreachable: {0}")]
    Transport(String),
    /// The source answered with something that is not a message.
    #[error("malformed screen message: {0}")]
    Decode(String),
}

/// Where the screen feed pulls its next message from.
#[async_trait]
pub trait ScreenSource: Send + Sync {
    /// Take the next pending message, if any.
    async fn next_message(&self) -> Result<Option<DisplayMessage>, FeedError>;
}
