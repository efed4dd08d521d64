// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ports to the text generator and the similarity lookup.

use crate::error::DispatchError;
use async_trait::async_trait;
use serde::Serialize;

/// Local text generation (one request at a time is all the backend handles).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, DispatchError>;
}

/// Best quote for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteMatch {
    /// Quote text.
    pub text: String,
    /// Author, when known.
    pub author: Option<String>,
    /// Thematic tags.
    pub tags: Vec<String>,
    /// Similarity in `[0, 1]`.
    pub score: f32,
}

/// Similarity search over stored quotes.
#[async_trait]
pub trait QuoteLookup: Send + Sync {
    /// Most similar quote to `query`, or `None` when nothing matches.
    async fn best_match(&self, query: &str) -> Result<Option<QuoteMatch>, DispatchError>;
}
