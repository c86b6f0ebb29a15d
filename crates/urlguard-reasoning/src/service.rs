//! Process-wide reasoning client, keyed by API key
//!
//! One client is resident at a time. A request carrying a different key than
//! the resident client rebuilds it; requests without a key use the configured
//! default.

use crate::backend::BackendFactory;
use crate::client::{ReasoningClient, ReasoningOutcome, DEFAULT_TIMEOUT};
use crate::error::ReasoningError;
use crate::prompt::DEFAULT_PROMPT_TEMPLATE;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Settings shared by every client the service builds
#[derive(Debug, Clone)]
pub struct ReasoningSettings {
    /// Key used when a request does not carry one
    pub default_api_key: Option<String>,

    pub timeout: Duration,

    /// Template used when a request does not carry one
    pub prompt_template: String,
}

impl Default for ReasoningSettings {
    fn default() -> Self {
        Self {
            default_api_key: None,
            timeout: DEFAULT_TIMEOUT,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

struct ConfiguredClient {
    api_key: String,
    client: Arc<ReasoningClient>,
}

pub struct ReasoningService {
    factory: Arc<dyn BackendFactory>,
    settings: ReasoningSettings,
    slot: RwLock<Option<ConfiguredClient>>,
}

impl ReasoningService {
    pub fn new(factory: Arc<dyn BackendFactory>, settings: ReasoningSettings) -> Self {
        Self {
            factory,
            settings,
            slot: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &ReasoningSettings {
        &self.settings
    }

    /// Key a request would use: its own if non-empty, else the default
    pub fn resolve_key<'a>(&'a self, request_key: Option<&'a str>) -> Option<&'a str> {
        request_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or_else(|| {
                self.settings
                    .default_api_key
                    .as_deref()
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
            })
    }

    pub fn has_key(&self, request_key: Option<&str>) -> bool {
        self.resolve_key(request_key).is_some()
    }

    /// Client bound to `api_key`, rebuilding the resident one if its key differs
    pub fn client_for(&self, api_key: &str) -> Result<Arc<ReasoningClient>, ReasoningError> {
        if let Some(configured) = self.slot.read().as_ref() {
            if configured.api_key == api_key {
                return Ok(configured.client.clone());
            }
        }

        let mut slot = self.slot.write();
        if let Some(configured) = slot.as_ref() {
            if configured.api_key == api_key {
                return Ok(configured.client.clone());
            }
        }

        let backend = self.factory.build(api_key)?;
        let client = Arc::new(
            ReasoningClient::new(backend)
                .with_timeout(self.settings.timeout)
                .with_template(self.settings.prompt_template.clone()),
        );
        let replaced = slot.is_some();
        *slot = Some(ConfiguredClient {
            api_key: api_key.to_string(),
            client: client.clone(),
        });

        info!(replaced, "remote reasoning client configured");
        Ok(client)
    }

    /// Ask the remote model about `url`. Every failure, including a missing
    /// key, becomes a fallback outcome.
    pub async fn assess(
        &self,
        url: &str,
        request_key: Option<&str>,
        template: Option<&str>,
    ) -> ReasoningOutcome {
        let client = self
            .resolve_key(request_key)
            .ok_or(ReasoningError::MissingApiKey)
            .and_then(|key| self.client_for(key));

        match client {
            Ok(client) => client.assess(url, template).await,
            Err(err) => {
                tracing::warn!(kind = err.kind(), error = %err, "remote reasoning unavailable, falling back");
                ReasoningOutcome::from_result(Err(err))
            }
        }
    }
}

impl std::fmt::Debug for ReasoningService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningService")
            .field("timeout", &self.settings.timeout)
            .field("has_default_key", &self.settings.default_api_key.is_some())
            .field("configured", &self.slot.read().is_some())
            .finish()
    }
}
