//! Blocking HTTP plumbing shared by the remote providers.

use std::{
    io::{BufRead, BufReader},
    time::Duration,
};

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::LlmError;

/// Longest error body kept in [`LlmError::Api`].
const MAX_ERROR_BODY: usize = 500;

/// A provider endpoint: base URL, auth headers, and error attribution.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Underlying client with the request timeout applied.
    client: Client,
    /// Provider name used in errors.
    provider: &'static str,
    /// Base URL without a trailing slash.
    base_url: String,
    /// Headers sent with every request.
    headers: Vec<(&'static str, String)>,
    /// Where the API key comes from, for authentication errors.
    key_hint: String,
}

impl Endpoint {
    /// Creates an endpoint for `provider` rooted at `base_url`.
    pub fn new(provider: &'static str, base_url: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::Http)?;
        Ok(Self {
            client,
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: Vec::new(),
            key_hint: "the configured API key".into(),
        })
    }

    /// Adds a header sent with every request.
    pub fn with_header(mut self, name: &'static str, value: String) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Sets the hint shown when the provider rejects the key.
    pub fn with_key_hint(mut self, hint: impl Into<String>) -> Self {
        self.key_hint = hint.into();
        self
    }

    /// Full URL for a path below the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POSTs a JSON body and returns the response once its status is a success.
    pub fn post(&self, path: &str, body: &JsonValue) -> Result<Response, LlmError> {
        let url = self.url(path);
        debug!(provider = self.provider, %url, "POST");
        let mut request = self.client.post(&url).json(body);
        for (name, value) in &self.headers {
            request = request.header(*name, value.as_str());
        }
        let response = request.send().map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(match status.as_u16() {
            401 | 403 => LlmError::Authentication {
                provider: self.provider,
                key_hint: self.key_hint.clone(),
            },
            code => LlmError::Api {
                provider: self.provider,
                status: code,
                body: truncate(body.trim(), MAX_ERROR_BODY),
            },
        })
    }

    /// POSTs a JSON body and decodes a JSON response.
    pub fn post_json<T: DeserializeOwned>(&self, path: &str, body: &JsonValue) -> Result<T, LlmError> {
        self.post(path, body)?
            .json()
            .map_err(|e| self.invalid(e.to_string()))
    }

    /// Calls `on_line` for each non-empty line of a streaming response.
    pub fn for_each_line(
        &self,
        response: Response,
        mut on_line: impl FnMut(&str) -> Result<bool, LlmError>,
    ) -> Result<(), LlmError> {
        for line in BufReader::new(response).lines() {
            let line = line.map_err(|e| self.invalid(format!("stream interrupted: {e}")))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !on_line(line)? {
                break;
            }
        }
        Ok(())
    }

    /// An [`LlmError::InvalidResponse`] attributed to this provider.
    pub fn invalid(&self, message: impl Into<String>) -> LlmError {
        LlmError::InvalidResponse {
            provider: self.provider,
            message: message.into(),
        }
    }

    /// Classifies a transport failure.
    fn transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                provider: self.provider,
                url: self.base_url.clone(),
            }
        } else if err.is_connect() {
            LlmError::Connection {
                provider: self.provider,
                url: self.base_url.clone(),
                source: err,
            }
        } else {
            LlmError::Http(err)
        }
    }
}

/// Truncates `s` to at most `max` characters.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let endpoint = Endpoint::new("ollama", "http://localhost:11434/", Duration::from_secs(1)).unwrap();
        assert_eq!(endpoint.url("/api/chat"), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }

    #[test]
    fn test_connection_refused_is_connection_error() {
        // Port 9 (discard) is closed on test machines.
        let endpoint = Endpoint::new("ollama", "http://127.0.0.1:9", Duration::from_secs(5)).unwrap();
        let err = endpoint.post("/api/chat", &json!({})).unwrap_err();
        assert!(
            matches!(err, LlmError::Connection { provider: "ollama", .. }),
            "got {err:?}"
        );
        assert!(err.hint().unwrap().contains("http://127.0.0.1:9"));
    }
}
