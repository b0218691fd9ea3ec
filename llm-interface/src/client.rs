use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use prospector_core::{AppConfig, CoreError, LlmError, Stage};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const MAX_COMPLETION_TOKENS: u32 = 25_000;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    max_completion_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Thin client over the chat-completions endpoint, always in forced-JSON
/// mode.
#[derive(Debug)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &AppConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        }
    }

    /// One structured-output request; the returned value is the parsed JSON
    /// object from the first choice.
    pub async fn complete_json(
        &self,
        stage: Stage,
        prompt: &str,
    ) -> Result<serde_json::Value, CoreError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "Return JSON only.",
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        };

        debug!("Calling {} for {} stage", self.model, stage);
        let response = self
            .http_client
            .post(format!("{}/chat/completions", OPENAI_API_BASE))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Network error during {} stage: {}", stage, e);
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("{} stage request failed with status {}", stage, status);
            let llm_error = match status.as_u16() {
                401 => LlmError::InvalidApiKey,
                429 => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(60);
                    LlmError::RateLimitExceeded { retry_after }
                }
                code if status.is_server_error() => LlmError::ServiceUnavailable {
                    status_code: code,
                },
                code => LlmError::RequestRejected { status_code: code },
            };
            return Err(CoreError::Llm(llm_error));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!("Unreadable {} stage response body: {}", stage, e);
            CoreError::Llm(LlmError::MalformedResponse {
                stage,
                details: e.to_string(),
            })
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            warn!("Empty response received for {} stage", stage);
            return Err(CoreError::Llm(LlmError::EmptyResponse { stage }));
        }

        serde_json::from_str(&content).map_err(|e| {
            warn!("Malformed JSON for {} stage: {}", stage, e);
            CoreError::Llm(LlmError::MalformedResponse {
                stage,
                details: e.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_in_openai_shape() {
        let request = ChatRequest {
            model: "o4-mini",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "Return JSON only.",
                },
                ChatMessage {
                    role: "user",
                    content: "hello",
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["max_completion_tokens"], 25_000);
    }

    #[test]
    fn response_content_is_optional() {
        let raw = r#"{"choices":[{"message":{"content":null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
