//! Request/response client for the chat-completion endpoint (spec.md §4.7).

use std::sync::Arc;

use crate::{error::Error, resilience::ResilientHttp, settings::ChatSettings};

use super::types::{ChatMessage, ChatRequest, ChatResponse};

/// Client for a chat-completion endpoint, sending through a
/// [`ResilientHttp`] pipeline.
pub struct ChatClient {
    http_client: reqwest::Client,
    settings: ChatSettings,
    resilience: Arc<ResilientHttp>,
}

impl ChatClient {
    pub fn new(http_client: reqwest::Client, settings: ChatSettings, resilience: Arc<ResilientHttp>) -> Self {
        Self {
            http_client,
            settings,
            resilience,
        }
    }

    /// Send `messages` to the configured chat-completion endpoint.
    ///
    /// - Non-2xx or empty body surfaces as `Error::Upstream`.
    /// - Malformed JSON surfaces as `Error::Serialization`.
    /// - Any resilience-layer failure (timeout, circuit-open, bulkhead
    ///   rejection, transport error) surfaces unchanged.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<ChatResponse, Error> {
        let url = format!("{}{}", self.settings.base_address, self.settings.endpoint);
        let body = ChatRequest {
            model: self.settings.model.clone(),
            messages,
        };
        let api_key = self.settings.api_key.clone();
        let client = self.http_client.clone();

        let response = self
            .resilience
            .execute(|| {
                client
                    .post(&url)
                    .bearer_auth(&api_key)
                    .json(&body)
                    .send()
            })
            .await?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "chat completion endpoint returned {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(Error::Upstream("chat completion endpoint returned an empty body".to_string()));
        }

        serde_json::from_str::<ChatResponse>(&text)
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}
