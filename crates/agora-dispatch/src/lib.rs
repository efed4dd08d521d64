// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dual-channel dispatcher: one input text, an immediate user reply and an
//! asynchronously delivered screen text, each with its own processing mode.
//!
//! # Modules
//!
//! - [`dispatcher`] - `submit`, settings and background screen work
//! - [`handlers`] - pass-through, generation, lookup, lookup-then-generate
//! - [`queue`] - single-worker generation queue with user priority
//! - [`slot`] - bounded screen outbox
//! - [`ports`] - text generator and quote lookup ports
//! - [`ollama`] - reqwest client for an Ollama-compatible generator
//! - [`lexical`] - in-memory quote index over graph payloads

pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod lexical;
pub mod ollama;
pub mod ports;
pub mod queue;
pub mod slot;

pub use dispatcher::{DispatchSettings, Dispatcher, ModeOverrides, UserResponse};
pub use error::DispatchError;
pub use handlers::{Handlers, Processed, MESSAGE_PLACEHOLDER};
pub use lexical::LexicalQuoteIndex;
pub use ollama::OllamaGenerator;
pub use ports::{QuoteLookup, QuoteMatch, TextGenerator};
pub use queue::{Channel, GenerationQueue};
pub use slot::{ScreenSlot, SCREEN_SLOT_CAPACITY};
