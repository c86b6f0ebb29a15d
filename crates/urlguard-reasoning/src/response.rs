//! Parsing of the remote model's free-text reply

use crate::error::ReasoningError;
use serde::Serialize;
use serde_json::{Map, Value};
use urlguard_core::{is_suspicious_label, Decision};

const DEFAULT_CONFIDENCE: f64 = 0.5;
const DEFAULT_REASONING: &str = "No reasoning provided";
const DEFAULT_THREAT_TYPE: &str = "unknown";

/// Structured verdict recovered from a reply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasoningVerdict {
    pub decision: Decision,

    /// Model's confidence, clamped to [0, 1]
    pub confidence: f64,

    pub reasoning: String,

    pub threat_type: String,
}

/// Locate the JSON payload in a reply.
///
/// Prefers the body of a ```` ```json ```` fence, then the body of the first
/// plain ```` ``` ```` fence, then the whole reply.
pub fn extract_json_block(text: &str) -> &str {
    let fenced = text
        .split_once("```json")
        .or_else(|| text.split_once("```"))
        .map(|(_, after)| after.split("```").next().unwrap_or(after));

    fenced.unwrap_or(text).trim()
}

/// Parse a reply into a verdict.
///
/// Missing fields fall back to `safe`, 0.5, "No reasoning provided" and
/// "unknown". A reply that is not a JSON object, or whose decision or
/// confidence cannot be interpreted, is a parse error.
pub fn parse_verdict(text: &str) -> Result<ReasoningVerdict, ReasoningError> {
    let block = extract_json_block(text);
    let value: Value =
        serde_json::from_str(block).map_err(|e| ReasoningError::parse(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(ReasoningError::parse("reply is not a JSON object"));
    };

    Ok(ReasoningVerdict {
        decision: parse_decision(&fields)?,
        confidence: parse_confidence(&fields)?,
        reasoning: text_field(&fields, "reasoning", DEFAULT_REASONING),
        threat_type: text_field(&fields, "threat_type", DEFAULT_THREAT_TYPE),
    })
}

fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

fn parse_decision(fields: &Map<String, Value>) -> Result<Decision, ReasoningError> {
    let Some(value) = present(fields, "decision") else {
        return Ok(Decision::Safe);
    };
    let Some(raw) = value.as_str() else {
        return Err(ReasoningError::parse("decision must be a string"));
    };

    let label = raw.trim().to_lowercase();
    if label == "safe" {
        Ok(Decision::Safe)
    } else if is_suspicious_label(&Value::String(label)) {
        Ok(Decision::Suspicious)
    } else {
        Err(ReasoningError::parse(format!("unrecognized decision '{}'", raw)))
    }
}

fn parse_confidence(fields: &Map<String, Value>) -> Result<f64, ReasoningError> {
    let confidence = match present(fields, "confidence") {
        None => DEFAULT_CONFIDENCE,
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ReasoningError::parse("confidence is not representable"))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ReasoningError::parse(format!("confidence '{}' is not a number", s)))?,
        Some(other) => {
            return Err(ReasoningError::parse(format!(
                "confidence must be a number, got {}",
                other
            )))
        }
    };

    if !confidence.is_finite() {
        return Err(ReasoningError::parse("confidence is not finite"));
    }
    Ok(confidence.clamp(0.0, 1.0))
}

fn text_field(fields: &Map<String, Value>, key: &str, default: &str) -> String {
    match present(fields, key) {
        None => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
