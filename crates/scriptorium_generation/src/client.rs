use crate::{ChatCompletionRequest, ChatCompletionResponse};
use scriptorium_error::BackendError;
use tracing::instrument;

/// Client for an OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ChatClient {
    /// Create a new client for `base_url` (e.g. "http://localhost:8080")
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!(base_url = %base_url, "Creating chat client");
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a chat completion request
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, BackendError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        tracing::debug!("Sending chat completion request to {}", url);

        let mut req = self
            .client
            .post(&url)
            .json(request)
            .header("Content-Type", "application/json");

        if let Some(api_key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await.map_err(|e| {
            tracing::error!("Request failed: {}", e);
            BackendError::new(format!("Request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Backend returned error: {}", status);
            return Err(BackendError::new(format!("Backend returned: {}", status)));
        }

        let result = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse response: {}", e);
            BackendError::new(format!("Failed to parse response: {}", e))
        })?;

        tracing::debug!("Chat completion successful");
        Ok(result)
    }
}
