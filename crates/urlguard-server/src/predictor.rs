//! Prediction orchestration
//!
//! Chooses between the local model and remote reasoning for each request.
//! The two strategies never mix: a request is answered entirely by one.

use crate::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use urlguard_classifiers::{extract_features, LocalClassifier, ModelCache, ModelHandle};
use urlguard_core::{normalize_url, Error, PredictRequest, PredictionResult, Result};
use urlguard_reasoning::ReasoningService;

/// Per-request choices
#[derive(Debug, Clone, Default)]
pub struct PredictOptions<'a> {
    /// Ask the remote model instead of the local one
    pub use_external: bool,

    /// API key for this request; overrides the configured default
    pub api_key: Option<&'a str>,

    /// Prompt template for this request
    pub prompt_template: Option<&'a str>,

    /// Model to use instead of the cached one
    pub model_handle: Option<ModelHandle>,
}

impl PredictOptions<'_> {
    pub fn strategy(&self) -> &'static str {
        if self.use_external {
            "remote"
        } else {
            "local"
        }
    }
}

/// A validated request and its prediction
#[derive(Debug, Clone)]
pub struct Classification {
    /// Canonical form of the requested URL
    pub url: String,
    pub result: PredictionResult,
}

pub struct Predictor {
    models: Arc<ModelCache>,
    classifier: LocalClassifier,
    reasoning: Arc<ReasoningService>,
}

impl Predictor {
    pub fn new(models: Arc<ModelCache>, reasoning: Arc<ReasoningService>) -> Self {
        Self {
            models,
            classifier: LocalClassifier::new(),
            reasoning,
        }
    }

    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    pub fn reasoning(&self) -> &ReasoningService {
        &self.reasoning
    }

    /// Validate a request and classify its URL.
    ///
    /// The local model sees the canonical URL; the remote model sees the URL
    /// as the client sent it, trimmed of surrounding whitespace.
    pub async fn classify(
        &self,
        request: &PredictRequest,
        options: PredictOptions<'_>,
    ) -> Result<Classification> {
        let canonical = normalize_url(&request.url)?;
        let target = if options.use_external {
            request.url.trim()
        } else {
            canonical.as_str()
        };

        let result = self.predict(target, options).await?;
        Ok(Classification {
            url: canonical.into_string(),
            result,
        })
    }

    /// Classify `url` with the strategy `options` selects.
    ///
    /// Remote failures are absorbed into a fallback result. A remote request
    /// with no usable API key fails before any call is made.
    pub async fn predict(&self, url: &str, options: PredictOptions<'_>) -> Result<PredictionResult> {
        let strategy = options.strategy();
        let start = Instant::now();
        metrics::record_request(strategy);

        let result = if options.use_external {
            self.predict_remote(url, &options).await
        } else {
            self.predict_local(url, options.model_handle).await
        };

        match &result {
            Ok(prediction) => {
                metrics::record_prediction(strategy, prediction, start.elapsed());
                debug!(
                    strategy,
                    decision = %prediction.decision,
                    source = %prediction.source,
                    "prediction complete"
                );
            }
            Err(err) => metrics::record_error(err.kind()),
        }
        result
    }

    async fn predict_local(
        &self,
        url: &str,
        model_handle: Option<ModelHandle>,
    ) -> Result<PredictionResult> {
        let handle = match model_handle {
            Some(handle) => handle,
            None => self.load_model().await?,
        };

        let features = extract_features(url);
        let local = self.classifier.predict(&handle, &features)?;
        Ok(PredictionResult::local(local.decision, local.score, features))
    }

    async fn predict_remote(
        &self,
        url: &str,
        options: &PredictOptions<'_>,
    ) -> Result<PredictionResult> {
        if !self.reasoning.has_key(options.api_key) {
            return Err(Error::config(
                "Gemini API key is required when use_gemini is enabled",
            ));
        }

        let outcome = self
            .reasoning
            .assess(url, options.api_key, options.prompt_template)
            .await;
        if outcome.is_fallback() {
            metrics::record_error("remote_reasoning");
        }
        Ok(outcome.into_prediction())
    }

    /// Resident model, reading the artifact off the async runtime if needed
    pub async fn load_model(&self) -> Result<ModelHandle> {
        if let Some(handle) = self.models.current() {
            return Ok(handle);
        }

        let models = self.models.clone();
        tokio::task::spawn_blocking(move || models.load(None))
            .await
            .map_err(|e| Error::internal(format!("model load task failed: {}", e)))?
    }

    /// Discard the resident model and read the artifact again
    pub async fn reload_model(&self) -> Result<ModelHandle> {
        let models = self.models.clone();
        let handle = tokio::task::spawn_blocking(move || models.reload(None))
            .await
            .map_err(|e| Error::internal(format!("model reload task failed: {}", e)))??;

        info!(model = handle.name(), "model reloaded");
        Ok(handle)
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("models", &self.models)
            .field("threshold", &self.classifier.threshold())
            .field("reasoning", &self.reasoning)
            .finish()
    }
}
