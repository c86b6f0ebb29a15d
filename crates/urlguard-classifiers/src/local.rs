//! Local classifier: applies a loaded model to a feature vector

use crate::model::{ModelCapability, ModelHandle};
use std::time::Instant;
use urlguard_core::{is_suspicious_label, Decision, Error, FeatureVector, Result};

/// Probability at or above which a URL is suspicious
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Decision made by the local model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPrediction {
    pub decision: Decision,

    /// Probability of the suspicious class; absent for label-only models
    pub score: Option<f64>,

    /// Latency in microseconds
    pub latency_us: u64,
}

/// Turns model output into a decision
#[derive(Debug, Clone, Copy)]
pub struct LocalClassifier {
    threshold: f64,
}

impl LocalClassifier {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Override the decision threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify a feature vector with the given model
    pub fn predict(&self, handle: &ModelHandle, features: &FeatureVector) -> Result<LocalPrediction> {
        let start = Instant::now();

        let (decision, score) = match handle.capability() {
            ModelCapability::Probabilistic(model) => {
                let probabilities = model.predict_proba(features)?;
                let suspicious = suspicious_probability(&probabilities)?;
                (Decision::from_probability(suspicious, self.threshold), Some(suspicious))
            }
            ModelCapability::LabelOnly(model) => {
                let label = model.predict_label(features)?;
                let decision = if is_suspicious_label(&label) {
                    Decision::Suspicious
                } else {
                    Decision::Safe
                };
                (decision, None)
            }
        };

        Ok(LocalPrediction {
            decision,
            score,
            latency_us: start.elapsed().as_micros() as u64,
        })
    }
}

impl Default for LocalClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Probability of the suspicious class: the second output when there are
/// several, otherwise the only one
fn suspicious_probability(probabilities: &[f64]) -> Result<f64> {
    let value = match probabilities {
        [] => return Err(Error::classifier("model returned no class probabilities")),
        [only] => *only,
        [_, suspicious, ..] => *suspicious,
    };

    if !(0.0..=1.0).contains(&value) {
        return Err(Error::classifier(format!(
            "model returned probability {} outside [0, 1]",
            value
        )));
    }
    Ok(value)
}
