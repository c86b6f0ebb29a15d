//! URLGuard Classifiers
//!
//! The local decision path for URL classification:
//! - Lexical feature extraction from canonical URLs
//! - Serialized model artifacts, introspected once at load time into a
//!   probability-capable or label-only capability
//! - A thread-safe, lazily loading model cache
//! - The local classifier that turns model output into a decision
//!
//! Everything here is synchronous and CPU-only; the only I/O is the one-time
//! artifact read performed by [`ModelCache`].

pub mod features;
pub mod local;
pub mod model;
pub mod model_cache;

pub use features::extract_features;
pub use local::{LocalClassifier, LocalPrediction, DEFAULT_THRESHOLD};
pub use model::{
    load_artifact, resolve_model_path, ArtifactLoader, DecisionTree, GradientBoosting,
    LabelModel, LogisticRegression, ModelArtifact, ModelCapability, ModelHandle, ModelLoader,
    ProbabilisticModel, TreeNode,
};
pub use model_cache::ModelCache;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::features::extract_features;
    pub use crate::local::{LocalClassifier, LocalPrediction};
    pub use crate::model::{ModelCapability, ModelHandle};
    pub use crate::model_cache::ModelCache;
}
