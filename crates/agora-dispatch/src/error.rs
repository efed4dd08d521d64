// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dispatcher error taxonomy.

use std::time::Duration;
use thiserror::Error;

/// Failure of one channel's computation.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The text generator failed or returned nothing.
    #[error("generation failed: {0}")]
    Generation(String),
    /// The similarity lookup failed.
    #[error("lookup failed: {0}")]
    Lookup(String),
    /// The lookup ran but found no quote.
    #[error("no similar quote found")]
    NoMatch,
    /// The job did not finish within the generation timeout.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    /// The generation worker is gone (dispatcher shut down).
    #[error("generation queue closed")]
    QueueClosed,
}
