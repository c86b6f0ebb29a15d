//! URLGuard Reasoning
//!
//! Classifies URLs by asking a remote generative model. The raw URL is
//! substituted into a prompt template, the reply is expected to be a JSON
//! object (possibly inside a fenced code block), and any failure along the
//! way turns into an explicit fallback outcome instead of an error.

pub mod backend;
pub mod client;
pub mod error;
pub mod gemini;
pub mod prompt;
pub mod response;
pub mod service;

pub use backend::{BackendFactory, ReasoningBackend};
pub use client::{ReasoningClient, ReasoningOutcome, DEFAULT_TIMEOUT};
pub use error::ReasoningError;
pub use gemini::{default_factory, GeminiConfig, GEMINI_SUPPORTED};
#[cfg(feature = "gemini")]
pub use gemini::{GeminiBackend, GeminiFactory};
pub use prompt::{render_prompt, DEFAULT_PROMPT_TEMPLATE, URL_PLACEHOLDER};
pub use response::{extract_json_block, parse_verdict, ReasoningVerdict};
pub use service::{ReasoningService, ReasoningSettings};
