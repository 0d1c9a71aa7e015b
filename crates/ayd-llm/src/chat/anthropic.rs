//! Anthropic messages API.

use ayd_config::ModelConfig;
use serde_json::{Value as JsonValue, json};

use super::{LanguageModel, Prompt, key_hint, require_api_key};
use crate::{ANTHROPIC_API_BASE, LlmError, http::Endpoint};

/// API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Chat client for `/v1/messages`.
#[derive(Debug)]
pub struct AnthropicClient {
    /// API endpoint with key and version headers.
    endpoint: Endpoint,
    /// Model name.
    model: String,
    /// Sampling temperature.
    temperature: f32,
    /// Maximum tokens to generate.
    max_tokens: u32,
}

impl AnthropicClient {
    /// Creates a client. Fails when no API key is configured.
    pub fn new(config: &ModelConfig) -> Result<Self, LlmError> {
        let key = require_api_key(config, "anthropic")?;
        let base = config.api_base.as_deref().unwrap_or(ANTHROPIC_API_BASE);
        let endpoint = Endpoint::new("anthropic", base, config.timeout)?
            .with_header("x-api-key", key)
            .with_header("anthropic-version", ANTHROPIC_VERSION.into())
            .with_key_hint(key_hint(config));
        Ok(Self {
            endpoint,
            model: config.name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Request body for `/v1/messages`.
    fn body(&self, prompt: &Prompt, stream: bool) -> JsonValue {
        json!({
            "model": self.model,
            "system": prompt.system,
            "messages": [{ "role": "user", "content": prompt.user }],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "stream": stream,
        })
    }
}

impl LanguageModel for AnthropicClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let response: JsonValue = self
            .endpoint
            .post_json("/v1/messages", &self.body(prompt, false))?;
        let blocks = response
            .get("content")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| self.endpoint.invalid("missing content"))?;
        Ok(blocks
            .iter()
            .filter(|b| b.get("type").and_then(JsonValue::as_str) == Some("text"))
            .filter_map(|b| b.get("text").and_then(JsonValue::as_str))
            .collect())
    }

    fn complete_streaming(
        &self,
        prompt: &Prompt,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<String, LlmError> {
        let response = self.endpoint.post("/v1/messages", &self.body(prompt, true))?;
        let mut answer = String::new();
        self.endpoint.for_each_line(response, |line| {
            match parse_event(line).map_err(|m| self.endpoint.invalid(m))? {
                StreamEvent::Text(text) => {
                    on_token(&text);
                    answer.push_str(&text);
                    Ok(true)
                }
                StreamEvent::Other => Ok(true),
                StreamEvent::Stop => Ok(false),
            }
        })?;
        Ok(answer)
    }
}

/// A decoded line of the messages event stream.
#[derive(Debug, PartialEq, Eq)]
enum StreamEvent {
    /// Text from a `content_block_delta`.
    Text(String),
    /// `event:` lines, pings, and block boundaries.
    Other,
    /// `message_stop`.
    Stop,
}

/// Parses one line of the event stream. Only `data:` lines carry payloads.
fn parse_event(line: &str) -> Result<StreamEvent, String> {
    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
        return Ok(StreamEvent::Other);
    };
    let value: JsonValue = serde_json::from_str(data).map_err(|e| e.to_string())?;
    match value.get("type").and_then(JsonValue::as_str) {
        Some("content_block_delta") => Ok(value
            .pointer("/delta/text")
            .and_then(JsonValue::as_str)
            .map_or(StreamEvent::Other, |t| StreamEvent::Text(t.to_string()))),
        Some("message_stop") => Ok(StreamEvent::Stop),
        Some("error") => Err(value
            .pointer("/error/message")
            .and_then(JsonValue::as_str)
            .unwrap_or("stream error")
            .to_string()),
        _ => Ok(StreamEvent::Other),
    }
}

#[cfg(test)]
mod tests {
    use ayd_config::LlmProvider;

    use super::*;

    #[test]
    fn test_parse_events() {
        assert_eq!(parse_event("event: content_block_delta"), Ok(StreamEvent::Other));
        assert_eq!(
            parse_event(
                r#"data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#
            ),
            Ok(StreamEvent::Text("Hello".into()))
        );
        assert_eq!(parse_event(r#"data: {"type":"ping"}"#), Ok(StreamEvent::Other));
        assert_eq!(parse_event(r#"data: {"type":"message_stop"}"#), Ok(StreamEvent::Stop));
        assert_eq!(
            parse_event(r#"data: {"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#),
            Err("Overloaded".into())
        );
    }

    #[test]
    fn test_body_puts_system_at_top_level() {
        let config = ModelConfig {
            provider: LlmProvider::Anthropic,
            name: "claude-3-haiku-20240307".into(),
            api_key: Some("key".into()),
            ..ModelConfig::default()
        };
        let client = AnthropicClient::new(&config).unwrap();
        let body = client.body(
            &Prompt {
                system: "answer from context".into(),
                user: "question".into(),
            },
            true,
        );
        assert_eq!(body["system"], "answer from context");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(client.endpoint.url("/v1/messages"), "https://api.anthropic.com/v1/messages");
    }
}
