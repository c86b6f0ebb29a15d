//! Shared application state

use crate::config::ServerConfig;
use crate::metrics::MeteredLoader;
use crate::predictor::Predictor;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::info;
use urlguard_classifiers::{ArtifactLoader, ModelCache};
use urlguard_core::Result;
use urlguard_reasoning::{default_factory, ReasoningService};

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Strategy selection and the resources behind it
    pub predictor: Arc<Predictor>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Build state from configuration. The model is not loaded here.
    pub fn new(config: ServerConfig, metrics_handle: PrometheusHandle) -> Result<Self> {
        let models = ModelCache::with_loader(
            &config.model_path,
            Arc::new(MeteredLoader::new(ArtifactLoader)),
        );

        let settings = config.gemini.reasoning_settings()?;
        let factory = default_factory(config.gemini.api.clone(), config.gemini.timeout());
        let reasoning = ReasoningService::new(factory, settings);

        info!(
            model_path = %config.model_path.display(),
            gemini_model = %config.gemini.api.model,
            default_key = config.gemini.api_key.is_some(),
            "application state initialized"
        );

        let predictor = Predictor::new(Arc::new(models), Arc::new(reasoning));
        Ok(Self::from_parts(config, predictor, metrics_handle))
    }

    pub fn from_parts(
        config: ServerConfig,
        predictor: Predictor,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            config: Arc::new(config),
            predictor: Arc::new(predictor),
            metrics_handle,
        }
    }
}
