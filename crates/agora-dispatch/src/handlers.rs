// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One handler per [`ProcessingMode`].

use crate::error::DispatchError;
use crate::ports::{QuoteLookup, TextGenerator};
use agora_app_core::{DisplayMessage, ProcessingMode, KIND_QUOTE};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Placeholder replaced by the input in prompt templates.
pub const MESSAGE_PLACEHOLDER: &str = "{message}";

/// Output of one handler run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Processed {
    /// Mode that produced the text.
    pub mode: ProcessingMode,
    /// Resulting text.
    pub text: String,
    /// Attribution, for looked-up quotes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// True when a fallback produced the text instead of the requested mode.
    pub fallback: bool,
}

impl Processed {
    /// Input returned unchanged.
    pub fn pass_through(input: &str) -> Self {
        Self {
            mode: ProcessingMode::PassThrough,
            text: input.to_owned(),
            author: None,
            fallback: false,
        }
    }

    /// Pass-through standing in for a failed `mode`.
    pub fn fallback_for(mode: ProcessingMode, input: &str) -> Self {
        Self {
            mode,
            fallback: true,
            ..Self::pass_through(input)
        }
    }

    /// Wire message for the screen channel.
    pub fn to_message(&self) -> DisplayMessage {
        let kind = if self.author.is_some() {
            KIND_QUOTE
        } else {
            self.mode.as_str()
        };
        DisplayMessage {
            text: self.text.clone(),
            kind: kind.to_owned(),
            author: self.author.clone(),
        }
    }
}

/// Shared handler set.
#[derive(Clone)]
pub struct Handlers {
    generator: Arc<dyn TextGenerator>,
    lookup: Arc<dyn QuoteLookup>,
    prompt_template: String,
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("prompt_template", &self.prompt_template)
            .finish_non_exhaustive()
    }
}

impl Handlers {
    /// Handlers over the given ports.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        lookup: Arc<dyn QuoteLookup>,
        prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            lookup,
            prompt_template: prompt_template.into(),
        }
    }

    /// Fill the prompt template with `input`.
    pub fn prompt_for(&self, input: &str) -> String {
        if self.prompt_template.contains(MESSAGE_PLACEHOLDER) {
            self.prompt_template.replace(MESSAGE_PLACEHOLDER, input)
        } else {
            format!("{}\n\n{input}", self.prompt_template)
        }
    }

    /// Run `mode` over `input`.
    pub async fn run(&self, mode: ProcessingMode, input: &str) -> Result<Processed, DispatchError> {
        match mode {
            ProcessingMode::PassThrough => Ok(Processed::pass_through(input)),
            ProcessingMode::LocalGeneration => self.generate(mode, input).await,
            ProcessingMode::SimilarityLookup => self.lookup(input).await,
            ProcessingMode::LookupThenGenerate => self.lookup_then_generate(input).await,
        }
    }

    async fn generate(&self, mode: ProcessingMode, input: &str) -> Result<Processed, DispatchError> {
        let text = self.generator.generate(&self.prompt_for(input)).await?;
        Ok(Processed {
            mode,
            text,
            author: None,
            fallback: false,
        })
    }

    async fn lookup(&self, input: &str) -> Result<Processed, DispatchError> {
        let hit = self
            .lookup
            .best_match(input)
            .await?
            .ok_or(DispatchError::NoMatch)?;
        Ok(Processed {
            mode: ProcessingMode::SimilarityLookup,
            text: hit.text,
            author: hit.author,
            fallback: false,
        })
    }

    async fn lookup_then_generate(&self, input: &str) -> Result<Processed, DispatchError> {
        let mode = ProcessingMode::LookupThenGenerate;
        let quote = match self.lookup(input).await {
            Ok(quote) => quote,
            Err(err) => {
                warn!(error = %err, "lookup failed; generating from the raw input");
                return self.generate(mode, input).await;
            }
        };
        match self.generate(mode, &quote.text).await {
            Ok(generated) => Ok(generated),
            Err(err) => {
                warn!(error = %err, "generation failed; returning the looked-up quote");
                Ok(Processed {
                    mode,
                    fallback: true,
                    ..quote
                })
            }
        }
    }
}
