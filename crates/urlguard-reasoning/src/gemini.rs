//! Gemini `generateContent` backend

use crate::backend::BackendFactory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "gemini")]
use crate::backend::ReasoningBackend;
use crate::error::ReasoningError;
#[cfg(feature = "gemini")]
use async_trait::async_trait;

/// Whether this build can call the Gemini API
pub const GEMINI_SUPPORTED: bool = cfg!(feature = "gemini");

/// Model and sampling settings sent with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API root, without the `/models/...` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_top_p() -> f32 {
    1.0
}

fn default_top_k() -> u32 {
    1
}

fn default_max_output_tokens() -> u32 {
    512
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl GeminiConfig {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize, Debug)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Deserialize, Debug, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

/// First non-empty candidate text in a `generateContent` response body
fn candidate_text(body: &str) -> Result<String, ReasoningError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ReasoningError::parse(e.to_string()))?;

    response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .find(|text| !text.trim().is_empty())
        .ok_or(ReasoningError::EmptyResponse)
}

/// Backend bound to one API key
#[cfg(feature = "gemini")]
pub struct GeminiBackend {
    http: reqwest::Client,
    api_key: String,
    config: GeminiConfig,
}

#[cfg(feature = "gemini")]
impl GeminiBackend {
    pub fn new(
        api_key: impl Into<String>,
        config: GeminiConfig,
        timeout: Duration,
    ) -> Result<Self, ReasoningError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            config,
        })
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }
}

#[cfg(feature = "gemini")]
#[async_trait]
impl ReasoningBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String, ReasoningError> {
        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), model = %self.config.model, "Gemini request failed");
            return Err(ReasoningError::Status {
                status: status.as_u16(),
                body,
            });
        }

        candidate_text(&body)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Builds [`GeminiBackend`]s sharing one configuration
#[cfg(feature = "gemini")]
#[derive(Debug, Clone)]
pub struct GeminiFactory {
    config: GeminiConfig,
    timeout: Duration,
}

#[cfg(feature = "gemini")]
impl GeminiFactory {
    pub fn new(config: GeminiConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }
}

#[cfg(feature = "gemini")]
impl BackendFactory for GeminiFactory {
    fn build(&self, api_key: &str) -> Result<Arc<dyn crate::ReasoningBackend>, ReasoningError> {
        Ok(Arc::new(GeminiBackend::new(
            api_key,
            self.config.clone(),
            self.timeout,
        )?))
    }
}

/// Factory for builds without remote reasoning support
#[cfg(not(feature = "gemini"))]
struct UnavailableFactory;

#[cfg(not(feature = "gemini"))]
impl BackendFactory for UnavailableFactory {
    fn build(&self, _api_key: &str) -> Result<Arc<dyn crate::ReasoningBackend>, ReasoningError> {
        Err(ReasoningError::Unavailable)
    }
}

/// The backend factory this build supports
pub fn default_factory(config: GeminiConfig, timeout: Duration) -> Arc<dyn BackendFactory> {
    #[cfg(feature = "gemini")]
    {
        Arc::new(GeminiFactory::new(config, timeout))
    }
    #[cfg(not(feature = "gemini"))]
    {
        let _ = (config, timeout);
        Arc::new(UnavailableFactory)
    }
}
