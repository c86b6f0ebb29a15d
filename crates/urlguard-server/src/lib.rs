//! URLGuard Server
//!
//! HTTP front end for URL classification. Each `POST /predict` request is
//! validated, then answered either by the local model or, when
//! `use_gemini=true`, by remote reasoning with a fail-open fallback.

pub mod cli;
pub mod config;
pub mod metrics;
pub mod predictor;
pub mod routes;
pub mod state;

pub use cli::Cli;
pub use config::{GeminiSection, ServerConfig};
pub use predictor::{Classification, PredictOptions, Predictor};
pub use routes::{create_router, AppError, API_KEY_HEADER, REQUEST_ID_HEADER};
pub use state::AppState;
