// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! [`TextGenerator`] backed by an Ollama-compatible `/api/generate` endpoint.

use crate::error::DispatchError;
use crate::ports::TextGenerator;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Non-streaming Ollama client.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaGenerator {
    /// Client for `model` at `endpoint` (e.g. `http://localhost:11434`).
    pub fn new(endpoint: &str, model: impl Into<String>, timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Generation(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            model: model.into(),
            temperature: 0.8,
            max_tokens: 100,
        })
    }

    /// Sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, DispatchError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };
        debug!(model = %self.model, "ollama generate");
        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| DispatchError::Generation(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DispatchError::Generation(format!(
                "ollama answered {}",
                response.status()
            )));
        }
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DispatchError::Generation(e.to_string()))?;
        let text = body.response.trim();
        if text.is_empty() {
            return Err(DispatchError::Generation("empty response".into()));
        }
        Ok(text.to_owned())
    }
}
