//! Model artifacts and the loaded model handle
//!
//! A model artifact is a single serialized file (JSON, or YAML when the
//! extension says so) tagged with its `kind`. Loading introspects the kind
//! once and exposes the model through one of two capabilities:
//! probability-capable or label-only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use urlguard_core::{Error, FeatureVector, Result};

/// Class-probability interface
pub trait ProbabilisticModel: Send + Sync {
    /// Class probabilities; binary models return `[p_safe, p_suspicious]`
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>>;
}

/// Hard-label interface
pub trait LabelModel: Send + Sync {
    /// Raw predicted label (number, string or bool)
    fn predict_label(&self, features: &FeatureVector) -> Result<serde_json::Value>;
}

/// What a loaded model can do
pub enum ModelCapability {
    Probabilistic(Box<dyn ProbabilisticModel>),
    LabelOnly(Box<dyn LabelModel>),
}

impl ModelCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Probabilistic(_) => "probabilistic",
            Self::LabelOnly(_) => "label_only",
        }
    }
}

struct LoadedModel {
    name: String,
    origin: Option<PathBuf>,
    capability: ModelCapability,
}

/// Shared, immutable handle to a loaded classifier.
///
/// Cloning is cheap; all clones point at the same model.
#[derive(Clone)]
pub struct ModelHandle {
    inner: Arc<LoadedModel>,
}

impl ModelHandle {
    fn new(name: impl Into<String>, origin: Option<PathBuf>, capability: ModelCapability) -> Self {
        Self {
            inner: Arc::new(LoadedModel {
                name: name.into(),
                origin,
                capability,
            }),
        }
    }

    /// Wrap a probability-capable model
    pub fn probabilistic(name: impl Into<String>, model: impl ProbabilisticModel + 'static) -> Self {
        Self::new(name, None, ModelCapability::Probabilistic(Box::new(model)))
    }

    /// Wrap a label-only model
    pub fn label_only(name: impl Into<String>, model: impl LabelModel + 'static) -> Self {
        Self::new(name, None, ModelCapability::LabelOnly(Box::new(model)))
    }

    /// Validate an artifact and select its capability
    pub fn from_artifact(artifact: ModelArtifact, origin: Option<PathBuf>) -> Result<Self> {
        artifact.validate()?;

        let name = origin
            .as_deref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or(artifact.kind())
            .to_string();

        let capability = match artifact {
            ModelArtifact::LogisticRegression(model) => ModelCapability::Probabilistic(Box::new(model)),
            ModelArtifact::GradientBoosting(model) => ModelCapability::Probabilistic(Box::new(model)),
            ModelArtifact::DecisionTree(model) => ModelCapability::LabelOnly(Box::new(model)),
        };

        Ok(Self::new(name, origin, capability))
    }

    pub fn capability(&self) -> &ModelCapability {
        &self.inner.capability
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// File the model was loaded from, if any
    pub fn origin(&self) -> Option<&Path> {
        self.inner.origin.as_deref()
    }

    pub fn is_probabilistic(&self) -> bool {
        matches!(self.inner.capability, ModelCapability::Probabilistic(_))
    }

    /// Whether both handles refer to the same loaded model
    pub fn ptr_eq(&self, other: &ModelHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.inner.name)
            .field("origin", &self.inner.origin)
            .field("capability", &self.inner.capability.as_str())
            .finish()
    }
}

/// Serialized classifier artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticRegression),
    GradientBoosting(GradientBoosting),
    DecisionTree(DecisionTree),
}

impl ModelArtifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic_regression",
            Self::GradientBoosting(_) => "gradient_boosting",
            Self::DecisionTree(_) => "decision_tree",
        }
    }

    /// Reject artifacts that could only fail or misbehave at prediction time
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::LogisticRegression(model) => {
                if model.coefficients.len() != FeatureVector::LEN {
                    return Err(Error::model_load(format!(
                        "logistic regression expects {} coefficients, found {}",
                        FeatureVector::LEN,
                        model.coefficients.len()
                    )));
                }
                ensure_finite("intercept", model.intercept)?;
                for coefficient in &model.coefficients {
                    ensure_finite("coefficient", *coefficient)?;
                }
                Ok(())
            }
            Self::GradientBoosting(model) => {
                ensure_finite("learning_rate", model.learning_rate)?;
                ensure_finite("init_score", model.init_score)?;
                for tree in &model.trees {
                    tree.validate(&|value: &f64| ensure_finite("leaf", *value))?;
                }
                Ok(())
            }
            Self::DecisionTree(model) => model.root.validate(&|_: &serde_json::Value| Ok(())),
        }
    }
}

fn ensure_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::model_load(format!("{} must be finite, found {}", field, value)))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Linear model over the feature vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl ProbabilisticModel for LogisticRegression {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let z = self
            .coefficients
            .iter()
            .zip(features.as_array())
            .fold(self.intercept, |acc, (c, x)| acc + c * x);
        let p = sigmoid(z);
        Ok(vec![1.0 - p, p])
    }
}

/// Boosted regression trees over log-odds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub learning_rate: f64,

    /// Prior log-odds of the suspicious class
    #[serde(default)]
    pub init_score: f64,

    #[serde(default)]
    pub trees: Vec<TreeNode<f64>>,
}

impl ProbabilisticModel for GradientBoosting {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let mut raw = self.init_score;
        for tree in &self.trees {
            raw += self.learning_rate * tree.evaluate(features)?;
        }
        let p = sigmoid(raw);
        Ok(vec![1.0 - p, p])
    }
}

/// Single tree whose leaves carry class labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub root: TreeNode<serde_json::Value>,
}

impl LabelModel for DecisionTree {
    fn predict_label(&self, features: &FeatureVector) -> Result<serde_json::Value> {
        self.root.evaluate(features).cloned()
    }
}

/// Binary tree node; a split sends `x <= threshold` to the left
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode<L> {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode<L>>,
        right: Box<TreeNode<L>>,
    },
    Leaf {
        leaf: L,
    },
}

impl<L> TreeNode<L> {
    /// Walk the tree to the leaf selected by `features`
    pub fn evaluate(&self, features: &FeatureVector) -> Result<&L> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { leaf } => return Ok(leaf),
                Self::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).ok_or_else(|| {
                        Error::classifier(format!("tree references unknown feature {}", feature))
                    })?;
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }

    fn validate(&self, check_leaf: &dyn Fn(&L) -> Result<()>) -> Result<()> {
        match self {
            Self::Leaf { leaf } => check_leaf(leaf),
            Self::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= FeatureVector::LEN {
                    return Err(Error::model_load(format!(
                        "tree references feature {} but only {} exist",
                        feature,
                        FeatureVector::LEN
                    )));
                }
                ensure_finite("threshold", *threshold)?;
                left.validate(check_leaf)?;
                right.validate(check_leaf)
            }
        }
    }
}

/// Loads a model handle from a resolved, existing path
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ModelHandle>;
}

/// Loader for on-disk [`ModelArtifact`] files
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactLoader;

impl ModelLoader for ArtifactLoader {
    fn load(&self, path: &Path) -> Result<ModelHandle> {
        load_artifact(path)
    }
}

/// Read and deserialize an artifact file into a handle
pub fn load_artifact(path: &Path) -> Result<ModelHandle> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::model_load(format!("Failed to read model file {}: {}", path.display(), e))
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    let artifact: ModelArtifact = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| {
            Error::model_load(format!("Failed to parse model file {}: {}", path.display(), e))
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| {
            Error::model_load(format!("Failed to parse model file {}: {}", path.display(), e))
        })?
    };

    tracing::debug!(path = %path.display(), kind = artifact.kind(), "parsed model artifact");
    ModelHandle::from_artifact(artifact, Some(path.to_path_buf()))
}

/// Expand `~` and make the path absolute when it exists
pub fn resolve_model_path(path: &Path) -> PathBuf {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    };

    std::fs::canonicalize(&expanded).unwrap_or(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn features(a: f64, b: f64, c: f64) -> FeatureVector {
        FeatureVector {
            digit_ratio_in_host: a,
            avg_token_length_url: b,
            avg_token_length_path: c,
        }
    }

    #[test]
    fn test_logistic_regression_probabilities() {
        let model = LogisticRegression {
            coefficients: vec![4.0, 0.0, 0.0],
            intercept: -1.0,
        };
        let probs = model.predict_proba(&features(0.25, 9.0, 9.0)).unwrap();
        assert_eq!(probs.len(), 2);
        assert!((probs[1] - 0.5).abs() < 1e-12);
        assert!((probs[0] + probs[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_boosting_from_json() {
        let artifact: ModelArtifact = serde_json::from_value(json!({
            "kind": "gradient_boosting",
            "learning_rate": 1.0,
            "init_score": 0.0,
            "trees": [
                {"feature": 0, "threshold": 0.1,
                 "left": {"leaf": -2.0},
                 "right": {"leaf": 2.0}}
            ]
        }))
        .unwrap();
        let handle = ModelHandle::from_artifact(artifact, None).unwrap();
        assert!(handle.is_probabilistic());
        assert_eq!(handle.name(), "gradient_boosting");

        let ModelCapability::Probabilistic(model) = handle.capability() else {
            panic!("expected probabilistic capability");
        };
        let low = model.predict_proba(&features(0.0, 1.0, 1.0)).unwrap();
        let high = model.predict_proba(&features(0.5, 1.0, 1.0)).unwrap();
        assert!(low[1] < 0.5);
        assert!(high[1] > 0.5);
    }

    #[test]
    fn test_decision_tree_is_label_only() {
        let artifact: ModelArtifact = serde_json::from_value(json!({
            "kind": "decision_tree",
            "root": {"feature": 2, "threshold": 6.0,
                     "left": {"leaf": "safe"},
                     "right": {"leaf": "phishing"}}
        }))
        .unwrap();
        let handle = ModelHandle::from_artifact(artifact, None).unwrap();
        assert!(!handle.is_probabilistic());

        let ModelCapability::LabelOnly(model) = handle.capability() else {
            panic!("expected label-only capability");
        };
        assert_eq!(model.predict_label(&features(0.0, 0.0, 6.0)).unwrap(), json!("safe"));
        assert_eq!(model.predict_label(&features(0.0, 0.0, 6.5)).unwrap(), json!("phishing"));
    }

    #[test]
    fn test_invalid_feature_index_rejected_at_load() {
        let artifact: ModelArtifact = serde_json::from_value(json!({
            "kind": "decision_tree",
            "root": {"feature": 7, "threshold": 1.0,
                     "left": {"leaf": 0}, "right": {"leaf": 1}}
        }))
        .unwrap();
        let err = ModelHandle::from_artifact(artifact, None).unwrap_err();
        assert!(matches!(err, Error::ModelLoad(_)));
    }

    #[test]
    fn test_wrong_coefficient_count_rejected() {
        let artifact = ModelArtifact::LogisticRegression(LogisticRegression {
            coefficients: vec![1.0],
            intercept: 0.0,
        });
        assert!(matches!(artifact.validate(), Err(Error::ModelLoad(_))));
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let result = serde_json::from_value::<ModelArtifact>(json!({"kind": "random_forest"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_handle_clones_share_model() {
        let handle = ModelHandle::label_only("stub", DecisionTree {
            root: TreeNode::Leaf { leaf: json!(0) },
        });
        let clone = handle.clone();
        assert!(handle.ptr_eq(&clone));

        let other = ModelHandle::label_only("stub", DecisionTree {
            root: TreeNode::Leaf { leaf: json!(0) },
        });
        assert!(!handle.ptr_eq(&other));
    }

    #[test]
    fn test_resolve_keeps_missing_relative_path() {
        let path = resolve_model_path(Path::new("does/not/exist.json"));
        assert_eq!(path, PathBuf::from("does/not/exist.json"));
    }
}
