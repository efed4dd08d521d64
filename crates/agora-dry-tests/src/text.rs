// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scripted text services: generator, quote lookup, enhancer.

use agora_dispatch::{DispatchError, QuoteLookup, QuoteMatch, TextGenerator};
use agora_display::{EnhanceError, Enhancer};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Generator that answers `"generated: {prompt}"` and records every prompt.
///
/// When gated, each call waits for a permit released with
/// [`ScriptedGenerator::release`], which lets tests hold the single
/// generation worker busy.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    prompts: Mutex<Vec<String>>,
    fail: AtomicBool,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedGenerator {
    /// Ungated generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose calls block until released.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    /// Let `n` blocked (or future) calls proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Make every call fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls.
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, DispatchError> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_owned());
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| DispatchError::Generation(e.to_string()))?
                .forget();
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(DispatchError::Generation("scripted failure".into()));
        }
        Ok(format!("generated: {prompt}"))
    }
}

/// Lookup that always answers with one fixed quote and counts calls.
#[derive(Debug)]
pub struct CountingLookup {
    quote: Option<QuoteMatch>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl CountingLookup {
    /// Lookup answering `text` by `author`.
    pub fn new(text: &str, author: &str) -> Self {
        Self {
            quote: Some(QuoteMatch {
                text: text.into(),
                author: Some(author.into()),
                tags: Vec::new(),
                score: 1.0,
            }),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Lookup that never finds anything.
    pub fn empty() -> Self {
        Self {
            quote: None,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every call fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteLookup for CountingLookup {
    async fn best_match(&self, _query: &str) -> Result<Option<QuoteMatch>, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DispatchError::Lookup("scripted failure".into()));
        }
        Ok(self.quote.clone())
    }
}

/// Enhancer with a scripted outcome.
#[derive(Debug, Clone)]
pub enum ScriptedEnhancer {
    /// Upper-cases the text.
    Shout,
    /// Always fails.
    Failing,
    /// Never answers within `Duration`.
    Stalling(Duration),
}

#[async_trait]
impl Enhancer for ScriptedEnhancer {
    async fn enhance(&self, text: &str) -> Result<String, EnhanceError> {
        match self {
            Self::Shout => Ok(text.to_uppercase()),
            Self::Failing => Err(EnhanceError::Transport("scripted failure".into())),
            Self::Stalling(d) => {
                tokio::time::sleep(*d).await;
                Ok(text.to_owned())
            }
        }
    }
}
