use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{CompletionProvider, CompletionRequest};

/// Ollama client talking to the `/api/chat` endpoint
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: Url,
    /// Model name to use for generation
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// HTTP client for making requests
    client: Client,
}

/// Chat message object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user or assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Chat response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl Ollama {
    /// Create a client for `endpoint` (e.g. `http://localhost:11434`)
    pub fn new(endpoint: &str, model: impl Into<String>, temperature: f32) -> Result<Self, ProviderError> {
        let with_scheme = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };
        let base_url = Url::parse(&with_scheme)
            .map_err(|e| ProviderError::ConnectionError(format!("Invalid Ollama endpoint '{}': {}", endpoint, e)))?;

        let client = Client::builder()
            // Ollama uses HTTP/1.1
            .http1_only()
            .pool_max_idle_per_host(20)
            .build()
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            base_url,
            model: model.into(),
            temperature,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))
    }

    /// Turn a completion request into the chat message list.
    ///
    /// Examples become alternating user/assistant turns ahead of the real
    /// user prompt.
    fn build_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.examples.len() * 2 + 2);
        messages.push(ChatMessage::new("system", &request.system_prompt));
        for example in &request.examples {
            messages.push(ChatMessage::new("user", &example.source));
            messages.push(ChatMessage::new("assistant", &example.translated));
        }
        messages.push(ChatMessage::new("user", &request.user_prompt));
        messages
    }

    /// Send a chat request
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = self.endpoint("api/chat")?;

        let response = self.client.post(url).json(request).send().await.map_err(map_transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read Ollama response: {}", e)))?;

        if !status.is_success() {
            error!("Ollama API error ({}): {}", status, body);
            return Err(map_status_error(status, body));
        }

        parse_chat_body(&body)
    }
}

/// Parse a chat reply, tolerating a streamed (JSON lines) body
fn parse_chat_body(body: &str) -> Result<ChatResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<ChatResponse>(body) {
        return Ok(response);
    }

    let parts: Vec<ChatResponse> = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    let Some(last) = parts.last() else {
        let preview: String = body.chars().take(500).collect();
        return Err(ProviderError::ParseError(format!("Unexpected Ollama response: {}", preview)));
    };

    debug!("Reassembled streamed Ollama response from {} parts", parts.len());
    Ok(ChatResponse {
        model: last.model.clone(),
        message: ChatMessage {
            role: "assistant".to_string(),
            content: parts.iter().map(|p| p.message.content.as_str()).collect(),
        },
        done: true,
        prompt_eval_count: last.prompt_eval_count,
        eval_count: last.eval_count,
    })
}

fn map_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::RequestFailed(format!("Ollama request timed out: {}", error))
    } else if error.is_connect() {
        ProviderError::ConnectionError(format!("Failed to connect to Ollama: {}", error))
    } else {
        ProviderError::RequestFailed(format!("Failed to send request to Ollama: {}", error))
    }
}

fn map_status_error(status: StatusCode, message: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl CompletionProvider for Ollama {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let chat_request = ChatRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request),
            options: Some(GenerationOptions {
                temperature: Some(self.temperature),
            }),
            stream: false,
        };

        let response = self.chat(&chat_request).await?;
        debug!(
            "Ollama {} answered ({:?} prompt / {:?} generated tokens)",
            response.model, response.prompt_eval_count, response.eval_count
        );

        if response.message.content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(response.message.content)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = self.endpoint("api/tags")?;
        let response = self.client.get(url).send().await.map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(map_status_error(status, body))
        }
    }
}
