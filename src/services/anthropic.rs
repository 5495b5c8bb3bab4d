use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::core::config::Settings;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One prior turn of a conversation, oldest first.
#[derive(Debug, Clone)]
pub(crate) struct ChatTurn {
    pub(crate) role: String,
    pub(crate) content: String,
}

impl ChatTurn {
    pub(crate) fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub(crate) fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Completion {
    pub(crate) text: String,
    pub(crate) tokens_used: Option<u64>,
}

#[derive(Debug, Clone)]
pub(crate) struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl AnthropicClient {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ai().ai_request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().anthropic_api_key.clone(),
            base_url: settings.ai().anthropic_base_url.trim_end_matches('/').to_string(),
            model: settings.ai().ai_model.clone(),
            max_tokens: settings.ai().ai_max_tokens,
            temperature: settings.ai().ai_temperature,
        })
    }

    pub(crate) fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    /// Sends `system` plus the turns to the messages endpoint and returns the
    /// first text block of the reply. Transient failures retry with backoff.
    pub(crate) async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<Completion> {
        if !self.is_configured() {
            anyhow::bail!("Anthropic API key is not configured");
        }

        let messages: Vec<Value> = turns
            .iter()
            .map(|turn| json!({"role": turn.role, "content": turn.content}))
            .collect();

        let payload = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "system": system,
            "messages": messages,
        });

        let url = format!("{}/v1/messages", self.base_url);
        let mut last_error = None;
        let mut body = Value::Null;

        for attempt in 0..=3 {
            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&payload)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    body = resp.json().await.unwrap_or(Value::Null);
                    if status.is_success() {
                        last_error = None;
                        break;
                    }
                    last_error = Some(anyhow::anyhow!("Anthropic API error ({status}): {body}"));
                    // Only rate limits and server errors are worth retrying.
                    if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
                        break;
                    }
                }
                Err(err) => {
                    last_error = Some(anyhow::anyhow!(err).context("Failed to call Anthropic API"));
                }
            }

            if attempt < 3 {
                tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt as u32))).await;
            }
        }

        if let Some(err) = last_error {
            return Err(err);
        }

        parse_completion(&body)
    }
}

fn parse_completion(body: &Value) -> Result<Completion> {
    let text = body
        .get("content")
        .and_then(|content| content.get(0))
        .and_then(|block| block.get("text"))
        .and_then(|value| value.as_str())
        .context("Missing Anthropic response content")?
        .to_string();

    let usage = body.get("usage");
    let tokens_used = match (
        usage.and_then(|u| u.get("input_tokens")).and_then(Value::as_u64),
        usage.and_then(|u| u.get("output_tokens")).and_then(Value::as_u64),
    ) {
        (Some(input), Some(output)) => Some(input + output),
        (Some(input), None) => Some(input),
        (None, Some(output)) => Some(output),
        (None, None) => None,
    };

    Ok(Completion { text, tokens_used })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_completion_reads_first_text_block() {
        let body = serde_json::json!({
            "content": [{"type": "text", "text": "hello"}],
            "usage": {"input_tokens": 12, "output_tokens": 30}
        });
        let completion = parse_completion(&body).unwrap();
        assert_eq!(completion.text, "hello");
        assert_eq!(completion.tokens_used, Some(42));
    }

    #[test]
    fn parse_completion_rejects_empty_body() {
        assert!(parse_completion(&Value::Null).is_err());
    }

    #[test]
    fn chat_turn_constructors_set_roles() {
        assert_eq!(ChatTurn::user("hi").role, "user");
        assert_eq!(ChatTurn::assistant("hi").role, "assistant");
    }
}
