//! OpenAI-compatible chat completions backend
//!
//! Posts the prompt as a single user message to `<endpoint>/v1/chat/completions`
//! and returns the first choice's content.

use super::CompletionModel;
use crate::error::AgentError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// Default model name
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variables checked for the API key, in order
const API_KEY_VARS: [&str; 2] = ["TYPOFIX_API_KEY", "OPENAI_API_KEY"];

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Chat completions client
pub struct OpenAiModel {
    /// API base URL, without the `/v1/...` path
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiModel {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            timeout,
        }
    }

    /// Build a client taking the API key from the environment
    ///
    /// A missing key is only an error for the official OpenAI endpoint;
    /// local servers usually accept anonymous requests.
    pub fn from_env(endpoint: &str, model: &str, timeout: Duration) -> Result<Self, AgentError> {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()));

        if api_key.is_none() && endpoint.contains("api.openai.com") {
            return Err(AgentError::MissingApiKey);
        }

        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(AgentError::ConfigError(format!(
                "endpoint must start with http:// or https://, got '{}'",
                endpoint
            )));
        }

        Ok(Self::new(endpoint, model, api_key, timeout))
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.endpoint.trim_end_matches('/')
        )
    }
}

impl CompletionModel for OpenAiModel {
    fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        let client = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let url = self.url();

        let mut request = client
            .post(&url)
            .set("Content-Type", "application/json");

        // Add API key if configured
        if let Some(ref api_key) = self.api_key {
            request = request.set("Authorization", &format!("Bearer {}", api_key));
        }

        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        tracing::debug!("Calling chat completions API: {} ({})", url, self.model);

        let response = request.send_json(&body).map_err(|e| match e {
            ureq::Error::Transport(ref t) => {
                let msg = t.to_string();
                if msg.contains("timed out") || msg.contains("timeout") {
                    AgentError::Network(format!(
                        "request timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    AgentError::Network(e.to_string())
                }
            }
            ureq::Error::Status(status, response) => {
                let detail = response.into_string().unwrap_or_default();
                AgentError::Remote(format!("API returned status {}: {}", status, detail.trim()))
            }
        })?;

        let parsed: ChatResponse = response
            .into_json()
            .map_err(|e| AgentError::Remote(format!("Failed to parse API response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AgentError::Remote("API response contained no completion".into()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}
