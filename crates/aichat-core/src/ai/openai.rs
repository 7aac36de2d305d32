use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::Serialize;

use crate::error::{ChatError, ChatResult};
use crate::state::Message;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIErrorBody {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

/// Read the API key from the named environment variable at call time.
pub(crate) fn resolve_api_key(api_key_env: &str) -> ChatResult<String> {
    match std::env::var(api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ChatError::Auth(format!(
            "The API key environment variable {} is not set",
            api_key_env
        ))),
    }
}

/// Turn a non-success response into the matching error kind, preferring the
/// service's own message over the raw body.
pub(crate) fn status_error(status: StatusCode, body: &str) -> ChatError {
    let detail = serde_json::from_str::<OpenAIErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let text = format!("OpenAI API error {}: {}", status, detail);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ChatError::Auth(text),
        _ => ChatError::Transport(text),
    }
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    base_url: String,
}

impl Default for OpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAIClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send the conversation and return the trimmed assistant text.
    ///
    /// One attempt only; every failure is mapped to a [`ChatError`], and so
    /// is a reply that is empty after trimming.
    pub async fn complete(
        &self,
        api_key_env: &str,
        model: &str,
        messages: &[Message],
    ) -> ChatResult<String> {
        let api_key = resolve_api_key(api_key_env)?;
        let request = OpenAIRequest { model, messages };

        tracing::info!(model, messages = messages.len(), "sending chat completion");

        let response = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "chat completion rejected");
            return Err(status_error(status, &text));
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let content = openai_response.choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Transport("OpenAI API returned no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        // A blank reply counts as a failed exchange
        let reply = content.trim();
        if reply.is_empty() {
            return Err(ChatError::Transport("OpenAI API returned an empty reply".to_string()));
        }

        Ok(reply.to_string())
    }
}
