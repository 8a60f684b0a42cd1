//! HTTP reference clients for the external generative services.

use super::{ContextMap, SpeechSynthesizer, TextGenerator};
use crate::intent::Tone;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Map a non-success HTTP status onto the error taxonomy.
///
/// 408 and 429 and the 5xx family are transient; anything else will not get
/// better on retry and is treated as a broken response from the service.
fn status_error(service: &str, status: u16, body: &str) -> Error {
    match status {
        408 => Error::timeout(format!("{service} answered 408: {body}")),
        429 => Error::rate_limited(429, format!("{service} throttled the request: {body}")),
        s if (500..=599).contains(&s) => {
            Error::service_unavailable(s, format!("{service} unavailable: {body}"))
        }
        s => Error::malformed(service, format!("unexpected status {s}: {body}")),
    }
}

fn request_error(service: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::timeout(format!("{service} request timed out: {err}"))
    } else {
        Error::network(format!("{service} request failed: {err}"))
    }
}

/// Chat-completions-style client for the text generation service.
#[derive(Debug)]
pub struct HttpTextGenerator {
    http_client: reqwest::Client,
    name: String,
    model: String,
    base_url: String,
    endpoint_path: String,
    api_key: String,
}

impl HttpTextGenerator {
    pub fn builder() -> HttpTextGeneratorBuilder {
        HttpTextGeneratorBuilder::new()
    }

    fn prompt_for(goal: &str, tone: Tone, context: &ContextMap) -> String {
        let mut prompt = format!(
            "Write a short spoken motivational message (30-250 words) for this goal: {goal}. \
             Tone: {tone}."
        );
        if !context.is_empty() {
            let ctx = serde_json::Value::Object(context.clone());
            prompt.push_str(&format!(" Situational context: {ctx}."));
        }
        prompt
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, goal: &str, tone: Tone, context: &ContextMap) -> Result<String> {
        let endpoint = format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint_path);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": Self::prompt_for(goal, tone, context) }
            ],
        });
        let response = self
            .http_client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(&self.name, e))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| request_error(&self.name, e))?;
        if !status.is_success() {
            return Err(status_error(&self.name, status.as_u16(), &raw));
        }

        let parsed: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| Error::malformed(&self.name, format!("response is not JSON: {e}")))?;
        let text = parsed["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                Error::malformed(&self.name, "response carries no message content")
            })?;
        if text.trim().is_empty() {
            return Err(Error::malformed(&self.name, "response content is empty"));
        }
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct HttpTextGeneratorBuilder {
    name: String,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    endpoint_path: Option<String>,
    timeout_secs: u64,
}

impl HttpTextGeneratorBuilder {
    pub fn new() -> Self {
        Self {
            name: "text-gen".to_string(),
            model: None,
            api_key: None,
            base_url: None,
            endpoint_path: None,
            timeout_secs: 30,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = Some(path.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<HttpTextGenerator> {
        let model = self
            .model
            .ok_or_else(|| Error::Configuration("text generator model must be specified".into()))?;
        let api_key = self
            .api_key
            .or_else(|| std::env::var("MOTIVA_TEXT_API_KEY").ok())
            .ok_or_else(|| Error::Configuration("text generator API key required".into()))?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        let endpoint_path = normalize_path(
            self.endpoint_path
                .unwrap_or_else(|| "/v1/chat/completions".to_string()),
        );
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to create HTTP client: {e}")))?;
        Ok(HttpTextGenerator {
            http_client,
            name: self.name,
            model,
            base_url,
            endpoint_path,
            api_key,
        })
    }
}

impl Default for HttpTextGeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Speech-endpoint client for the synthesis service.
pub struct HttpSpeechSynthesizer {
    http_client: reqwest::Client,
    name: String,
    model: String,
    base_url: String,
    endpoint_path: String,
    api_key: String,
}

impl HttpSpeechSynthesizer {
    pub fn builder() -> HttpSpeechSynthesizerBuilder {
        HttpSpeechSynthesizerBuilder::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes> {
        let endpoint = format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint_path);
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": voice_id,
            "response_format": "mp3",
        });
        let response = self
            .http_client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(&self.name, e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| request_error(&self.name, e))?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            return Err(status_error(&self.name, status.as_u16(), &text));
        }
        if bytes.is_empty() {
            return Err(Error::malformed(&self.name, "synthesis returned no audio"));
        }
        Ok(bytes)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct HttpSpeechSynthesizerBuilder {
    name: String,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    endpoint_path: Option<String>,
    timeout_secs: u64,
}

impl HttpSpeechSynthesizerBuilder {
    pub fn new() -> Self {
        Self {
            name: "speech-synth".to_string(),
            model: None,
            api_key: None,
            base_url: None,
            endpoint_path: None,
            timeout_secs: 60,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = Some(path.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<HttpSpeechSynthesizer> {
        let model = self
            .model
            .ok_or_else(|| Error::Configuration("synthesizer model must be specified".into()))?;
        let api_key = self
            .api_key
            .or_else(|| std::env::var("MOTIVA_SPEECH_API_KEY").ok())
            .ok_or_else(|| Error::Configuration("synthesizer API key required".into()))?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        let endpoint_path = normalize_path(
            self.endpoint_path
                .unwrap_or_else(|| "/v1/audio/speech".to_string()),
        );
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to create HTTP client: {e}")))?;
        Ok(HttpSpeechSynthesizer {
            http_client,
            name: self.name,
            model,
            base_url,
            endpoint_path,
            api_key,
        })
    }
}

impl Default for HttpSpeechSynthesizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_path(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransientKind;

    #[test]
    fn status_mapping_matches_taxonomy() {
        assert!(matches!(
            status_error("svc", 429, ""),
            Error::Transient {
                kind: TransientKind::RateLimited,
                ..
            }
        ));
        assert!(matches!(
            status_error("svc", 503, ""),
            Error::Transient {
                kind: TransientKind::ServiceUnavailable,
                ..
            }
        ));
        assert!(matches!(
            status_error("svc", 408, ""),
            Error::Transient {
                kind: TransientKind::Timeout,
                ..
            }
        ));
        assert!(matches!(
            status_error("svc", 400, "bad request"),
            Error::MalformedResponse { .. }
        ));
    }

    #[test]
    fn builder_requires_model() {
        let err = HttpTextGenerator::builder()
            .api_key("k")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("model"));
    }
}
