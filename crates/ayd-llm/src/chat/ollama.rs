//! Ollama `/api/chat`.

use ayd_config::ModelConfig;
use reqwest::blocking::Response;
use serde_json::{Value as JsonValue, json};

use super::{LanguageModel, Prompt};
use crate::{LlmError, http::Endpoint};

/// Chat client for a local Ollama server.
#[derive(Debug)]
pub struct OllamaClient {
    /// Server endpoint.
    endpoint: Endpoint,
    /// Model tag, e.g. `tinyllama:1.1b`.
    model: String,
    /// Sampling temperature.
    temperature: f32,
    /// Maximum tokens to generate.
    max_tokens: u32,
}

impl OllamaClient {
    /// Creates a client for `config.base_url`.
    pub fn new(config: &ModelConfig) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: Endpoint::new("ollama", &config.base_url, config.timeout)?,
            model: config.name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Request body for `/api/chat`.
    fn body(&self, prompt: &Prompt, stream: bool) -> JsonValue {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "stream": stream,
            "options": {
                "temperature": self.temperature,
                "num_predict": self.max_tokens,
            },
        })
    }

    /// Sends a chat request, mapping 404 to [`LlmError::ModelNotFound`].
    fn send(&self, prompt: &Prompt, stream: bool) -> Result<Response, LlmError> {
        self.endpoint
            .post("/api/chat", &self.body(prompt, stream))
            .map_err(|e| match e {
                LlmError::Api { status: 404, .. } => LlmError::ModelNotFound {
                    model: self.model.clone(),
                },
                e => e,
            })
    }
}

impl LanguageModel for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let response: JsonValue = self
            .send(prompt, false)?
            .json()
            .map_err(|e| self.endpoint.invalid(e.to_string()))?;
        match parse_chunk(&response) {
            Ok((content, _)) => Ok(content),
            Err(message) => Err(self.endpoint.invalid(message)),
        }
    }

    fn complete_streaming(
        &self,
        prompt: &Prompt,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<String, LlmError> {
        let response = self.send(prompt, true)?;
        let mut answer = String::new();
        self.endpoint.for_each_line(response, |line| {
            let value: JsonValue =
                serde_json::from_str(line).map_err(|e| self.endpoint.invalid(e.to_string()))?;
            let (content, done) = parse_chunk(&value).map_err(|m| self.endpoint.invalid(m))?;
            if !content.is_empty() {
                on_token(&content);
                answer.push_str(&content);
            }
            Ok(!done)
        })?;
        Ok(answer)
    }
}

/// Extracts `(message.content, done)` from a response object.
fn parse_chunk(value: &JsonValue) -> Result<(String, bool), String> {
    if let Some(error) = value.get("error").and_then(JsonValue::as_str) {
        return Err(error.to_string());
    }
    let content = value
        .pointer("/message/content")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string();
    let done = value.get("done").and_then(JsonValue::as_bool).unwrap_or(false);
    Ok((content, done))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OllamaClient {
        OllamaClient::new(&ModelConfig::default()).unwrap()
    }

    #[test]
    fn test_body_carries_options() {
        let prompt = Prompt {
            system: "be brief".into(),
            user: "hi".into(),
        };
        let body = client().body(&prompt, true);
        assert_eq!(body["model"], "tinyllama:1.1b");
        assert_eq!(body["stream"], true);
        assert_eq!(body["options"]["num_predict"], 2048);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_parse_stream_chunks() {
        let chunk = json!({ "message": { "role": "assistant", "content": "Hel" }, "done": false });
        assert_eq!(parse_chunk(&chunk), Ok(("Hel".into(), false)));
        let last = json!({ "message": { "role": "assistant", "content": "" }, "done": true });
        assert_eq!(parse_chunk(&last), Ok((String::new(), true)));
        let error = json!({ "error": "model 'x' not found" });
        assert!(parse_chunk(&error).is_err());
    }

    #[test]
    fn test_unreachable_server() {
        let config = ModelConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..ModelConfig::default()
        };
        let prompt = Prompt {
            system: String::new(),
            user: "hello".into(),
        };
        let err = OllamaClient::new(&config).unwrap().complete(&prompt).unwrap_err();
        assert!(matches!(err, LlmError::Connection { .. }), "got {err:?}");
        assert!(err.hint().unwrap().contains("is Ollama running at http://127.0.0.1:9"));
    }
}
