//! URLGuard Core
//!
//! Core types and utilities shared across URLGuard components.
//!
//! This crate provides:
//! - The error taxonomy used by every strategy and the HTTP surface
//! - Shared prediction types (decisions, sources, results)
//! - Request validation and URL canonicalization
//! - Textual URL splitting shared with feature extraction

pub mod error;
pub mod types;
pub mod url_parts;
pub mod validation;

pub use error::{Error, Result};
pub use types::{
    is_suspicious_label, Decision, FeatureVector, PredictionDetails, PredictionResult,
    PredictionSource,
};
pub use url_parts::{split_url, UrlParts};
pub use validation::{
    normalize_url, parse_request, validate_request, CanonicalUrl, Payload, PredictRequest,
    ALLOWED_SCHEMES, MAX_URL_LENGTH,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Decision, FeatureVector, PredictionResult, PredictionSource};
    pub use crate::validation::{validate_request, CanonicalUrl, PredictRequest};
}
