//! Reasoning client and fail-open outcome

use crate::backend::ReasoningBackend;
use crate::error::ReasoningError;
use crate::prompt::{render_prompt, DEFAULT_PROMPT_TEMPLATE};
use crate::response::{parse_verdict, ReasoningVerdict};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use urlguard_core::{Decision, PredictionResult, PredictionSource};

/// Upper bound on one remote call, including reading the reply
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Threat type reported by a fallback verdict
const FALLBACK_THREAT_TYPE: &str = "error";

/// Result of asking the remote model about a URL
#[derive(Debug, Clone, PartialEq)]
pub enum ReasoningOutcome {
    /// The model answered with a usable verdict
    Verdict(ReasoningVerdict),

    /// The call failed; `error` says why
    Fallback { error: String },
}

impl ReasoningOutcome {
    pub fn from_result(result: Result<ReasoningVerdict, ReasoningError>) -> Self {
        match result {
            Ok(verdict) => Self::Verdict(verdict),
            Err(err) => Self::Fallback {
                error: err.to_string(),
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Convert into a prediction.
    ///
    /// A fallback is reported as `safe` with score 0.0 and the error text as
    /// its reasoning.
    pub fn into_prediction(self) -> PredictionResult {
        match self {
            Self::Verdict(verdict) => PredictionResult::reasoning(
                verdict.decision,
                verdict.confidence,
                PredictionSource::GeminiApi,
                verdict.reasoning,
                verdict.threat_type,
            ),
            Self::Fallback { error } => PredictionResult::reasoning(
                Decision::Safe,
                0.0,
                PredictionSource::GeminiApiFallback,
                error,
                FALLBACK_THREAT_TYPE,
            ),
        }
    }
}

/// Renders prompts, calls a backend under a deadline and parses the reply
pub struct ReasoningClient {
    backend: Arc<dyn ReasoningBackend>,
    timeout: Duration,
    default_template: String,
}

impl ReasoningClient {
    pub fn new(backend: Arc<dyn ReasoningBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
            default_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Template used when a call does not supply one
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.default_template = template.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the backend about `url`, surfacing every failure
    pub async fn check(
        &self,
        url: &str,
        template: Option<&str>,
    ) -> Result<ReasoningVerdict, ReasoningError> {
        let prompt = render_prompt(template.unwrap_or(&self.default_template), url);
        let start = Instant::now();

        let reply = tokio::time::timeout(self.timeout, self.backend.generate(&prompt))
            .await
            .map_err(|_| ReasoningError::Timeout(self.timeout))??;

        let verdict = parse_verdict(&reply)?;
        debug!(
            backend = self.backend.name(),
            decision = %verdict.decision,
            confidence = verdict.confidence,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "remote verdict received"
        );
        Ok(verdict)
    }

    /// Ask the backend about `url`; failures become a fallback outcome
    pub async fn assess(&self, url: &str, template: Option<&str>) -> ReasoningOutcome {
        let result = self.check(url, template).await;
        if let Err(err) = &result {
            warn!(backend = self.backend.name(), kind = err.kind(), error = %err, "remote reasoning failed, falling back");
        }
        ReasoningOutcome::from_result(result)
    }
}

impl std::fmt::Debug for ReasoningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningClient")
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
