//! Core types for URLGuard

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label strings a label-only classifier may emit for the suspicious class
const SUSPICIOUS_LABEL_STRINGS: &[&str] = &["1", "suspicious", "malicious", "phishing"];

/// Final verdict for a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Safe,
    Suspicious,
}

impl Decision {
    /// Decision for a probability of the suspicious class; the boundary is inclusive
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Self::Suspicious
        } else {
            Self::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Suspicious => "suspicious",
        }
    }

    pub fn is_suspicious(&self) -> bool {
        matches!(self, Self::Suspicious)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which strategy produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionSource {
    /// Local numeric classifier
    #[serde(rename = "ml_model")]
    MlModel,
    /// Remote reasoning service answered
    #[serde(rename = "gemini_api")]
    GeminiApi,
    /// Remote reasoning service failed and the fail-open verdict was used
    #[serde(rename = "gemini_api_fallback")]
    GeminiApiFallback,
}

impl PredictionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MlModel => "ml_model",
            Self::GeminiApi => "gemini_api",
            Self::GeminiApiFallback => "gemini_api_fallback",
        }
    }
}

impl fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexical summary of a canonical URL, in model input order.
///
/// Serialized with the feature names the classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Fraction of host characters that are decimal digits
    #[serde(rename = "ratio_digits_host")]
    pub digit_ratio_in_host: f64,

    /// Mean token length over the whole URL string
    #[serde(rename = "avg_words_raw")]
    pub avg_token_length_url: f64,

    /// Mean token length over the path segment
    #[serde(rename = "avg_word_path")]
    pub avg_token_length_path: f64,
}

impl FeatureVector {
    /// Number of features the classifier consumes
    pub const LEN: usize = 3;

    /// Feature names in model input order
    pub const NAMES: [&'static str; Self::LEN] =
        ["ratio_digits_host", "avg_words_raw", "avg_word_path"];

    pub fn as_array(&self) -> [f64; Self::LEN] {
        [
            self.digit_ratio_in_host,
            self.avg_token_length_url,
            self.avg_token_length_path,
        ]
    }

    /// Feature value by model input index
    pub fn get(&self, index: usize) -> Option<f64> {
        self.as_array().get(index).copied()
    }

    /// Named feature map for observability
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        Self::NAMES.into_iter().zip(self.as_array()).collect()
    }
}

/// Strategy-specific part of a prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionDetails {
    /// Local model: the features the decision was made on
    Features { features: FeatureVector },

    /// Remote reasoning: the service's explanation
    Reasoning {
        reasoning: String,
        threat_type: String,
    },
}

/// Unified prediction returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub decision: Decision,

    /// Probability of the suspicious class (or remote confidence).
    ///
    /// `None` (serialized as `null`) when a label-only model made the call,
    /// which keeps it distinct from a real score of 0.0.
    pub score: Option<f64>,

    pub source: PredictionSource,

    #[serde(flatten)]
    pub details: PredictionDetails,
}

impl PredictionResult {
    /// Result of the local model path
    pub fn local(decision: Decision, score: Option<f64>, features: FeatureVector) -> Self {
        Self {
            decision,
            score,
            source: PredictionSource::MlModel,
            details: PredictionDetails::Features { features },
        }
    }

    /// Result of the remote reasoning path (success or fallback)
    pub fn reasoning(
        decision: Decision,
        score: f64,
        source: PredictionSource,
        reasoning: impl Into<String>,
        threat_type: impl Into<String>,
    ) -> Self {
        Self {
            decision,
            score: Some(score),
            source,
            details: PredictionDetails::Reasoning {
                reasoning: reasoning.into(),
                threat_type: threat_type.into(),
            },
        }
    }

    pub fn features(&self) -> Option<&FeatureVector> {
        match &self.details {
            PredictionDetails::Features { features } => Some(features),
            PredictionDetails::Reasoning { .. } => None,
        }
    }
}

/// Check whether a raw classifier label belongs to the suspicious class.
///
/// Accepts numeric 1, the strings "1", "suspicious", "malicious", "phishing",
/// and boolean true.
pub fn is_suspicious_label(label: &serde_json::Value) -> bool {
    match label {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64() == Some(1.0),
        serde_json::Value::String(s) => SUSPICIOUS_LABEL_STRINGS.contains(&s.as_str()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(Decision::from_probability(0.5, 0.5), Decision::Suspicious);
        assert_eq!(Decision::from_probability(0.4999, 0.5), Decision::Safe);
        assert_eq!(Decision::from_probability(1.0, 0.5), Decision::Suspicious);
    }

    #[test]
    fn test_suspicious_labels() {
        for label in [json!(1), json!(1.0), json!("1"), json!("suspicious"), json!("malicious"), json!("phishing"), json!(true)] {
            assert!(is_suspicious_label(&label), "expected {label} to be suspicious");
        }
        for label in [json!(0), json!("0"), json!("safe"), json!(false), json!("Phishing"), json!(null)] {
            assert!(!is_suspicious_label(&label), "expected {label} to be safe");
        }
    }

    #[test]
    fn test_local_result_serialization() {
        let features = FeatureVector {
            digit_ratio_in_host: 0.25,
            avg_token_length_url: 4.0,
            avg_token_length_path: 5.0,
        };
        let result = PredictionResult::local(Decision::Suspicious, Some(0.75), features);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["decision"], "suspicious");
        assert_eq!(value["score"], 0.75);
        assert_eq!(value["source"], "ml_model");
        assert_eq!(value["features"]["ratio_digits_host"], 0.25);
        assert_eq!(value["features"]["avg_words_raw"], 4.0);
        assert_eq!(value["features"]["avg_word_path"], 5.0);
        assert!(value.get("reasoning").is_none());
    }

    #[test]
    fn test_label_only_score_is_null_not_zero() {
        let result = PredictionResult::local(Decision::Safe, None, FeatureVector::default());
        let value = serde_json::to_value(&result).unwrap();
        assert!(value["score"].is_null());
        assert_ne!(value["score"], json!(0.0));
    }

    #[test]
    fn test_reasoning_result_serialization() {
        let result = PredictionResult::reasoning(
            Decision::Safe,
            0.0,
            PredictionSource::GeminiApiFallback,
            "timed out",
            "error",
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["source"], "gemini_api_fallback");
        assert_eq!(value["reasoning"], "timed out");
        assert_eq!(value["threat_type"], "error");
        assert_eq!(value["score"], 0.0);
        assert!(result.features().is_none());
    }

    #[test]
    fn test_feature_names_follow_input_order() {
        let features = FeatureVector {
            digit_ratio_in_host: 1.0,
            avg_token_length_url: 2.0,
            avg_token_length_path: 3.0,
        };
        assert_eq!(
            features.named(),
            vec![("ratio_digits_host", 1.0), ("avg_words_raw", 2.0), ("avg_word_path", 3.0)]
        );
        assert_eq!(features.get(2), Some(3.0));
        assert_eq!(features.get(3), None);
    }
}
