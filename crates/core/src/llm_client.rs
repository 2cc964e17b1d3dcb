//! Text-Generation Client
//!
//! The assistant depends on two capability shapes of a generative model: a
//! stateless prompt-to-text call and a stateful conversation. `TextGenerator`
//! is the seam; `ChatSession` keeps the conversation history on our side so
//! any backend that accepts a message list can serve both shapes.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// One exchange of a conversation: what we sent and what the model replied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub input: String,
    pub output: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request to the model failed: {0}")]
    Http(String),
    #[error("the model did not answer within {0} seconds")]
    Timeout(u64),
    #[error("the model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response from the model: {0}")]
    InvalidResponse(String),
    #[error("the model returned an empty response")]
    EmptyResponse,
}

/// A generic client for a generative text model.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait TextGenerator {
    /// Makes a single stateless call and returns the generated text.
    fn generate_once(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Continues a conversation: `history` holds the prior turns in order and
    /// `message` is the new input.
    fn converse(&self, history: &[Turn], message: &str) -> Result<String, GenerationError>;
}

/// A multi-turn conversation with accumulated history.
pub struct ChatSession<'a> {
    generator: &'a dyn TextGenerator,
    history: Vec<Turn>,
}

impl<'a> ChatSession<'a> {
    pub fn open(generator: &'a dyn TextGenerator) -> Self {
        Self {
            generator,
            history: Vec::new(),
        }
    }

    /// Sends `message`, records the turn and returns the reply.
    ///
    /// A failed call leaves the history unchanged.
    pub fn send(&mut self, message: &str) -> Result<String, GenerationError> {
        let output = self.generator.converse(&self.history, message)?;
        self.history.push(Turn {
            input: message.to_string(),
            output: output.clone(),
        });
        debug!(turns = self.history.len(), "Chat session extended");
        Ok(output)
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }
}

/// Supported hosted model providers. Both speak the OpenAI chat-completions dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
}

impl Provider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4o",
            Provider::Gemini => "gemini-1.5-flash",
        }
    }
}

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize, Debug, PartialEq)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Serialize, Debug, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum Role {
    User,
    Assistant,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Flattens prior turns plus the new message into the wire message list.
fn conversation_messages<'a>(history: &'a [Turn], message: &'a str) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 1);
    for turn in history {
        messages.push(ChatMessage {
            role: Role::User,
            content: &turn.input,
        });
        messages.push(ChatMessage {
            role: Role::Assistant,
            content: &turn.output,
        });
    }
    messages.push(ChatMessage {
        role: Role::User,
        content: message,
    });
    messages
}

fn first_text(response: ChatResponse) -> Result<String, GenerationError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::InvalidResponse("no choices in response".to_string()))?
        .message
        .content
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(content)
}

/// An implementation of `TextGenerator` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    http: reqwest::blocking::Client,
    config: ClientConfig,
}

impl OpenAICompatibleClient {
    /// Creates a blocking client whose every request is bounded by `config.timeout`.
    pub fn new(config: ClientConfig) -> Result<Self, GenerationError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn complete(&self, messages: Vec<ChatMessage<'_>>) -> Result<String, GenerationError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages,
        };
        debug!(model = %self.config.model, messages = request.messages.len(), "Calling model");

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(%status, "Model endpoint rejected the request");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        first_text(parsed)
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.config.timeout.as_secs())
        } else {
            GenerationError::Http(e.to_string())
        }
    }
}

impl TextGenerator for OpenAICompatibleClient {
    fn generate_once(&self, prompt: &str) -> Result<String, GenerationError> {
        self.complete(conversation_messages(&[], prompt))
    }

    fn converse(&self, history: &[Turn], message: &str) -> Result<String, GenerationError> {
        self.complete(conversation_messages(history, message))
    }
}
