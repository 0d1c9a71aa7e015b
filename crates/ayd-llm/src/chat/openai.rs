//! OpenAI chat completions, or any server speaking the same API.

use ayd_config::ModelConfig;
use serde_json::{Value as JsonValue, json};

use super::{LanguageModel, Prompt, key_hint, require_api_key};
use crate::{LlmError, OPENAI_API_BASE, http::Endpoint};

/// Chat client for `/chat/completions`.
#[derive(Debug)]
pub struct OpenAiClient {
    /// API endpoint with bearer auth.
    endpoint: Endpoint,
    /// Model name.
    model: String,
    /// Sampling temperature.
    temperature: f32,
    /// Maximum tokens to generate.
    max_tokens: u32,
}

impl OpenAiClient {
    /// Creates a client. Fails when no API key is configured.
    pub fn new(config: &ModelConfig) -> Result<Self, LlmError> {
        let key = require_api_key(config, "openai")?;
        let base = config.api_base.as_deref().unwrap_or(OPENAI_API_BASE);
        let endpoint = Endpoint::new("openai", base, config.timeout)?
            .with_header("authorization", format!("Bearer {key}"))
            .with_key_hint(key_hint(config));
        Ok(Self {
            endpoint,
            model: config.name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Request body for `/chat/completions`.
    fn body(&self, prompt: &Prompt, stream: bool) -> JsonValue {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": stream,
        })
    }
}

impl LanguageModel for OpenAiClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let response: JsonValue = self
            .endpoint
            .post_json("/chat/completions", &self.body(prompt, false))?;
        response
            .pointer("/choices/0/message/content")
            .and_then(JsonValue::as_str)
            .map(String::from)
            .ok_or_else(|| self.endpoint.invalid("missing choices[0].message.content"))
    }

    fn complete_streaming(
        &self,
        prompt: &Prompt,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<String, LlmError> {
        let response = self
            .endpoint
            .post("/chat/completions", &self.body(prompt, true))?;
        let mut answer = String::new();
        self.endpoint.for_each_line(response, |line| {
            match parse_sse_line(line).map_err(|m| self.endpoint.invalid(m))? {
                SseLine::Delta(text) => {
                    on_token(&text);
                    answer.push_str(&text);
                    Ok(true)
                }
                SseLine::Ignored => Ok(true),
                SseLine::Done => Ok(false),
            }
        })?;
        Ok(answer)
    }
}

/// One line of a chat-completions event stream.
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    /// A content fragment.
    Delta(String),
    /// Comments, role-only deltas, and other non-content lines.
    Ignored,
    /// `data: [DONE]`.
    Done,
}

/// Parses a server-sent event line.
fn parse_sse_line(line: &str) -> Result<SseLine, String> {
    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
        return Ok(SseLine::Ignored);
    };
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }
    let value: JsonValue = serde_json::from_str(data).map_err(|e| e.to_string())?;
    if let Some(message) = value.pointer("/error/message").and_then(JsonValue::as_str) {
        return Err(message.to_string());
    }
    Ok(value
        .pointer("/choices/0/delta/content")
        .and_then(JsonValue::as_str)
        .filter(|t| !t.is_empty())
        .map_or(SseLine::Ignored, |t| SseLine::Delta(t.to_string())))
}
