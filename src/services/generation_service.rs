use crate::services::prompt::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Hard cap on simultaneous outbound generation calls. Extra callers wait on
/// the permit; the 60-second transport timeout bounds the worst case.
const MAX_CONCURRENT_REQUESTS: usize = 2;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The text-completion capability the pipeline depends on. An absent result
/// means "service unavailable, degrade to fallback" and is never an error.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
        extended_reasoning: bool,
    ) -> Option<String>;
}

/// Gateway to the remote generation service.
///
/// Holds the persistent client session when a credential was configured at
/// startup; otherwise each call falls back to a one-shot HTTP request. Both
/// transports hit the same endpoint with the same payload. Constructed once
/// at startup and shared by handle; the semaphore is the only state shared
/// between concurrent pipeline runs.
#[derive(Clone)]
pub struct GenerationService {
    client: Option<Client>,
    api_key: Option<String>,
    api_url: String,
    model: String,
    permits: Arc<Semaphore>,
}

impl GenerationService {
    pub fn new(
        api_key: Option<String>,
        api_url: String,
        model: String,
        client: Option<Client>,
    ) -> Self {
        Self {
            client: client.filter(|_| api_key.is_some()),
            api_key,
            api_url,
            model,
            permits: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends one completion request. Returns `None` for a missing credential,
    /// transport failure, non-success status or a body without extractable
    /// text content. No retries; pacing belongs to the caller.
    pub async fn request(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
        extended_reasoning: bool,
    ) -> Option<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("generation service not configured, skipping call");
            return None;
        };

        let _permit = self.permits.acquire().await.ok()?;

        let payload = json!({
            "model": self.model,
            "thinking": { "type": if extended_reasoning { "enabled" } else { "disabled" } },
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
            "stream": false,
        });

        let client = match &self.client {
            Some(persistent) => persistent.clone(),
            None => Client::new(),
        };

        let response = match client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("generation request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("generation service returned status {}", response.status());
            return None;
        }

        let body: JsonValue = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("malformed generation response body: {}", e);
                return None;
            }
        };

        extract_content(&body)
    }
}

fn extract_content(body: &JsonValue) -> Option<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
}

#[async_trait]
impl CompletionBackend for GenerationService {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
        extended_reasoning: bool,
    ) -> Option<String> {
        self.request(messages, temperature, max_tokens, extended_reasoning)
            .await
    }
}
