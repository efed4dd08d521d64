// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Orchestrator for the Agora explorer.
//!
//! [`Explorer`] composes the graph store, highlight selection, orbit
//! controller, message overlay and screen feed, owns their lifetimes, and is
//! the only component allowed to replace the graph.
//!
//! # Modules
//!
//! - [`explorer`] - the orchestrator and its event routing
//! - [`event`] - UI events
//! - [`source`] - procedural and JSON graph sources
//! - [`error`] - explorer error type

pub mod error;
pub mod event;
pub mod explorer;
pub mod source;

pub use error::ExplorerError;
pub use event::ExplorerEvent;
pub use explorer::{Explorer, LOAD_ALERT_TTL};
pub use source::{filter_by_tag, GraphSource, JsonSource, ProceduralSource};
