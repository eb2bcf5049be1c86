use std::time::Duration;

use serde::{Deserialize, Serialize};

use tqa_core::error::AppError;

use super::ChatModel;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TEMPERATURE: f64 = 0.5;
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Client for an OpenAI-compatible `chat/completions` endpoint.
///
/// The request timeout is the pipeline's generation deadline: when it
/// expires the call fails with a retryable `GENERATION_UNAVAILABLE` instead
/// of blocking the query indefinitely.
#[derive(Debug, Clone)]
pub struct OpenAiHttpModel {
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAiHttpModel {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::new(
                "GENERATION_CONFIG_INVALID",
                "Generation base URL must be http(s)",
            )
            .with_details(format!("base_url={base_url}")));
        }
        if model.trim().is_empty() {
            return Err(AppError::new(
                "GENERATION_CONFIG_INVALID",
                "Generation model name is required",
            ));
        }

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout: DEFAULT_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl ChatModel for OpenAiHttpModel {
    fn complete(&self, system: &str, user: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let resp = ureq::post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .timeout(self.timeout)
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("GENERATION_UNAVAILABLE", "Failed to encode generation request")
                    .with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: ChatResponse = r.into_json().map_err(|e| {
                    AppError::new("GENERATION_UNAVAILABLE", "Failed to decode generation response")
                        .with_details(e.to_string())
                })?;
                let answer = v
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .unwrap_or_default();
                if answer.trim().is_empty() {
                    return Err(AppError::new(
                        "GENERATION_UNAVAILABLE",
                        "Generation response was empty",
                    ));
                }
                Ok(answer)
            }
            Ok(r) => Err(
                AppError::new("GENERATION_UNAVAILABLE", "Generation request failed")
                    .with_details(format!("status={}", r.status()))
                    .with_retryable(true),
            ),
            Err(e) => Err(
                AppError::new("GENERATION_UNAVAILABLE", "Failed to call generation endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}
