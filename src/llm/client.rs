//! HTTP client for chat-completion APIs.
//!
//! Supports OpenAI-compatible `/v1/chat/completions` endpoints and the
//! Ollama `/api/chat` endpoint. Both are used in plain request/response
//! mode with a single user message.

use super::{CompletionModel, CompletionParams};
use crate::config::{ModelConfig, ModelProvider};
use crate::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Message in a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// OpenAI chat completions request.
#[derive(Debug, Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// OpenAI chat completions response.
#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Chat-completion client over HTTP.
pub struct HttpCompletionModel {
    provider: ModelProvider,
    api_url: String,
    api_key: Option<String>,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl HttpCompletionModel {
    /// Create a client for the given provider and base URL.
    pub fn new(
        provider: ModelProvider,
        api_url: &str,
        api_key: Option<String>,
        timeout_seconds: u64,
    ) -> Result<Self, ModelError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        Ok(Self {
            provider,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_seconds,
            http_client,
        })
    }

    /// Create a client from the `[model]` config section.
    ///
    /// The OpenAI provider requires an API key.
    pub fn from_config(config: &ModelConfig, api_key: Option<String>) -> Result<Self, ModelError> {
        if config.provider == ModelProvider::Openai && api_key.is_none() {
            return Err(ModelError::MissingApiKey(config.api_key_env.clone()));
        }
        Self::new(
            config.provider,
            &config.api_url,
            api_key,
            config.timeout_seconds,
        )
    }

    fn endpoint(&self) -> String {
        match self.provider {
            ModelProvider::Openai => format!("{}/v1/chat/completions", self.api_url),
            ModelProvider::Ollama => format!("{}/api/chat", self.api_url),
        }
    }

    async fn post<T: Serialize>(&self, body: &T) -> Result<reqwest::Response, ModelError> {
        let url = self.endpoint();
        let mut request = self.http_client.post(&url).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout(self.timeout_seconds)
            } else if e.is_connect() {
                ModelError::Connect(self.api_url.clone())
            } else {
                ModelError::Transport(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionModel for HttpCompletionModel {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String, ModelError> {
        debug!(
            "Sending {} char prompt to {} ({:?})",
            prompt.len(),
            params.model,
            self.provider
        );

        match self.provider {
            ModelProvider::Openai => {
                let request = OpenAiChatRequest {
                    model: &params.model,
                    messages: vec![ChatMessage::user(prompt)],
                    temperature: params.temperature,
                };
                let response: OpenAiChatResponse = self
                    .post(&request)
                    .await?
                    .json()
                    .await
                    .map_err(|e| ModelError::Decode(e.to_string()))?;

                let content = response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content);
                non_empty(content)
            }
            ModelProvider::Ollama => {
                let request = OllamaChatRequest {
                    model: &params.model,
                    messages: vec![ChatMessage::user(prompt)],
                    stream: false,
                    options: OllamaOptions {
                        temperature: params.temperature,
                    },
                };
                let response: OllamaChatResponse = self
                    .post(&request)
                    .await?
                    .json()
                    .await
                    .map_err(|e| ModelError::Decode(e.to_string()))?;

                non_empty(Some(response.message.content))
            }
        }
    }
}

/// A missing or blank reply is a model failure, not model output.
fn non_empty(content: Option<String>) -> Result<String, ModelError> {
    content
        .filter(|c| !c.trim().is_empty())
        .ok_or(ModelError::EmptyReply)
}
