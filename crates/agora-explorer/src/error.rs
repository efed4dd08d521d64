// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Explorer error type.

use agora_graph::GraphError;
use thiserror::Error;

/// Errors surfaced to the explorer's caller.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// The content source could not deliver a graph.
    #[error("graph source failed: {0}")]
    GraphSource(String),
    /// The delivered graph is malformed.
    #[error("invalid graph: {0}")]
    Graph(#[from] GraphError),
    /// The explorer was disposed.
    #[error("explorer disposed")]
    Disposed,
}
