//! LLM client — the single point of entry for all generation calls.
//!
//! Talks to an OpenRouter-compatible chat completions API. Every helper
//! returns `Option`: `None` means the key is unconfigured, the call failed
//! or timed out, or the response did not parse. Callers treat absence as
//! degraded output, never as a pipeline abort.

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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

/// The single generation client shared by all pipelines.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl LlmClient {
    /// `api_key: None` builds a disabled client: every call returns `None`.
    /// The request timeout is independent of the supervisor's task deadline.
    pub fn new(
        api_key: Option<String>,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Calls the LLM and parses the response text as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn chat_json<T: DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Option<T> {
        let text = self.chat(system, user, temperature, true).await?;
        let text = strip_json_fences(&text);
        match serde_json::from_str(text) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("LLM returned non-JSON: {e}");
                None
            }
        }
    }

    /// Calls the LLM and returns the trimmed plain-text response.
    pub async fn chat_text(&self, system: &str, user: &str, temperature: f32) -> Option<String> {
        let text = self.chat(system, user, temperature, false).await?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        json_mode: bool,
    ) -> Option<String> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                warn!("OPENROUTER_API_KEY not set — LLM generation skipped");
                return None;
            }
        };

        let request_body = ChatRequest {
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
            temperature,
            // Not all routed models support response_format natively, so the
            // prompts also demand JSON-only output.
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!("LLM call failed: {e}");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {status}: {body}");
            return None;
        }

        let parsed: ChatResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!("LLM response body unreadable: {e}");
                return None;
            }
        };

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);

        debug!("LLM call succeeded ({} chars)", content.as_deref().map_or(0, str::len));
        content
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
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
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[tokio::test]
    async fn test_unconfigured_client_returns_none() {
        let llm = LlmClient::new(
            None,
            "https://openrouter.ai/api/v1".to_string(),
            "test-model".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!llm.is_configured());
        assert!(llm.chat_text("system", "user", 0.7).await.is_none());
        assert!(llm
            .chat_json::<serde_json::Value>("system", "user", 0.3)
            .await
            .is_none());
    }
}
