/// LLM Client — the single point of entry for all OpenAI API calls.
///
/// ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
/// All LLM interactions MUST go through this module.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/responses";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One schema-constrained generation call: a system/user prompt pair plus the
/// JSON Schema the Responses API should decode against.
#[derive(Debug, Clone)]
pub struct GenerationCall {
    pub model: String,
    pub system: String,
    pub user: String,
    pub schema_name: &'static str,
    pub schema: Value,
}

/// The generation-service seam. The pipeline only sees this trait;
/// `OpenAiClient` is the production backend, tests substitute a mock.
///
/// Carried in `AppState` as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Runs one generation call and returns the raw output text.
    /// Callers parse the text themselves (defensively — the schema constraint
    /// is a hint to the service, not a guarantee).
    async fn generate(&self, call: GenerationCall) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage<'a>>,
    text: TextFormat<'a>,
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct TextFormat<'a> {
    format: SchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct SchemaFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
    name: &'a str,
    schema: &'a Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    output: Vec<OutputItem>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl OpenAiResponse {
    /// Extracts the text of the first output_text block in the first message.
    fn output_text(&self) -> Option<&str> {
        self.output
            .iter()
            .filter(|item| item.item_type == "message")
            .flat_map(|item| item.content.iter())
            .find(|b| b.block_type == "output_text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// The production OpenAI client.
/// Wraps the Responses API with retry logic and structured-output plumbing.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Makes a raw call to the Responses API, returning the parsed response.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    async fn call(&self, call: &GenerationCall) -> Result<OpenAiResponse, LlmError> {
        let request_body = OpenAiRequest {
            model: &call.model,
            input: vec![
                InputMessage {
                    role: "system",
                    content: &call.system,
                },
                InputMessage {
                    role: "user",
                    content: &call.user,
                },
            ],
            text: TextFormat {
                format: SchemaFormat {
                    format_type: "json_schema",
                    name: call.schema_name,
                    schema: &call.schema,
                    strict: true,
                },
            },
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(OPENAI_API_URL)
                .bearer_auth(&self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Try to parse error message
                let message = serde_json::from_str::<OpenAiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response.text().await?;
            let parsed: OpenAiResponse = serde_json::from_str(&body)?;

            if let Some(usage) = &parsed.usage {
                debug!(
                    "LLM call succeeded: model={}, input_tokens={}, output_tokens={}",
                    call.model, usage.input_tokens, usage.output_tokens
                );
            }

            return Ok(parsed);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, call: GenerationCall) -> Result<String, LlmError> {
        let response = self.call(&call).await?;
        let text = response.output_text().ok_or(LlmError::EmptyContent)?;
        Ok(text.to_string())
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"revision\": \"검토 부탁드립니다.\"}\n```";
        assert_eq!(
            strip_json_fences(input),
            "{\"revision\": \"검토 부탁드립니다.\"}"
        );
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"revision\": \"\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"revision\": \"\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"revision\": \"\"}";
        assert_eq!(strip_json_fences(input), "{\"revision\": \"\"}");
    }

    #[test]
    fn test_output_text_picks_first_text_block() {
        let raw = serde_json::json!({
            "output": [
                {"type": "reasoning", "content": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "{\"ok\":1}"}
                ]}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });
        let parsed: OpenAiResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.output_text(), Some("{\"ok\":1}"));
    }

    #[test]
    fn test_output_text_empty_output_is_none() {
        let raw = serde_json::json!({"output": [], "usage": null});
        let parsed: OpenAiResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.output_text(), None);
    }
}
