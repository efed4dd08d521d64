// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HTTP clients: the daemon's screen-text poll endpoint and an optional
//! rewrite endpoint.

use crate::port::{EnhanceError, Enhancer};
use agora_app_core::{DisplayMessage, FeedError, ScreenSource};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Poll path served by `agorad`.
pub const SCREEN_TEXT_PATH: &str = "/api/screen-text";

/// [`ScreenSource`] that polls `GET {base}/api/screen-text`.
///
/// `204 No Content` means nothing is pending.
#[derive(Debug, Clone)]
pub struct HttpScreenSource {
    client: Client,
    url: String,
}

impl HttpScreenSource {
    /// Source polling the daemon at `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Source sharing an existing client.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}{SCREEN_TEXT_PATH}", base_url.trim_end_matches('/')),
        }
    }

    /// Full poll URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ScreenSource for HttpScreenSource {
    async fn next_message(&self) -> Result<Option<DisplayMessage>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => response
                .json::<DisplayMessage>()
                .await
                .map(Some)
                .map_err(|e| FeedError::Decode(e.to_string())),
            status => Err(FeedError::Transport(format!("unexpected status {status}"))),
        }
    }
}

#[derive(Serialize)]
struct EnhanceRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EnhanceResponse {
    text: String,
}

/// [`Enhancer`] that posts `{"text": ..}` and reads back `{"text": ..}`.
#[derive(Debug, Clone)]
pub struct HttpEnhancer {
    client: Client,
    endpoint: String,
}

impl HttpEnhancer {
    /// Enhancer posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Enhancer for HttpEnhancer {
    async fn enhance(&self, text: &str) -> Result<String, EnhanceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EnhanceRequest { text })
            .send()
            .await
            .map_err(|e| EnhanceError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| EnhanceError::Transport(e.to_string()))?;
        let body: EnhanceResponse = response
            .json()
            .await
            .map_err(|e| EnhanceError::Response(e.to_string()))?;
        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_url_joins_without_double_slash() {
        assert_eq!(
            HttpScreenSource::new("http://127.0.0.1:5000/").url(),
            "http://127.0.0.1:5000/api/screen-text"
        );
    }
}
