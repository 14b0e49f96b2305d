use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant who analyzes sentiment.";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("request to completion endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion endpoint returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed completion response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("completion response has no choices")]
    NoChoices,

    #[error("completion response has empty content")]
    EmptyAnswer,
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// One sentence describing the sentiment of `text`, verbatim from the model.
    async fn classify(&self, text: &str) -> Result<String, ClassifierError>;
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub fn user_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of the following text and respond with a full sentence, including the word POSITIVE, NEUTRAL, or NEGATIVE. Text: '{}'",
        text
    )
}

pub fn build_request(model: &str, text: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: SYSTEM_PROMPT.into(),
            },
            ChatMessage {
                role: "user".into(),
                content: user_prompt(text),
            },
        ],
    }
}

/// Turns an HTTP status and body into the first choice's text.
pub fn parse_completion(status: u16, body: &str) -> Result<String, ClassifierError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        return Err(ClassifierError::Api { status, message });
    }

    let response: ChatResponse = serde_json::from_str(body)?;
    let first = response
        .choices
        .into_iter()
        .next()
        .ok_or(ClassifierError::NoChoices)?;

    match first.message.content {
        Some(content) if !content.is_empty() => Ok(content),
        _ => Err(ClassifierError::EmptyAnswer),
    }
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiClassifier {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClassifier {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            endpoint: format!("{}/chat/completions", config.openai_base_url),
        }
    }
}

#[async_trait]
impl SentimentClassifier for OpenAiClassifier {
    async fn classify(&self, text: &str) -> Result<String, ClassifierError> {
        let payload = build_request(&self.model, text);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        parse_completion(status, &body)
    }
}
