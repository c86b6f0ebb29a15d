//! Model cache integration tests
//!
//! Exercises the load-once guarantee under concurrent first callers and the
//! full feature → model → decision path against on-disk artifacts.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use urlguard_classifiers::{
    extract_features, load_artifact, LocalClassifier, ModelCache, ModelHandle, ModelLoader,
};
use urlguard_core::{Decision, Error, Result};

/// Loader that counts invocations and is slow enough to widen the race window
struct CountingLoader {
    loads: AtomicUsize,
    delay: Duration,
}

impl CountingLoader {
    fn new(delay: Duration) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            delay,
        }
    }

    fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelLoader for CountingLoader {
    fn load(&self, path: &Path) -> Result<ModelHandle> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        load_artifact(path)
    }
}

const LOGISTIC_ARTIFACT: &str = r#"{
    "kind": "logistic_regression",
    "coefficients": [6.0, 0.1, 0.1],
    "intercept": -2.0
}"#;

fn artifact_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn concurrent_first_loads_read_artifact_once() {
    let file = artifact_file(LOGISTIC_ARTIFACT);
    let loader = Arc::new(CountingLoader::new(Duration::from_millis(50)));
    let cache = Arc::new(ModelCache::with_loader(file.path(), loader.clone()));

    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let cache = cache.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                cache.load(None).expect("load succeeds")
            })
        })
        .collect();

    let loaded: Vec<ModelHandle> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(loader.load_count(), 1);
    let first = &loaded[0];
    assert!(loaded.iter().all(|h| h.ptr_eq(first)));
}

#[test]
fn later_callers_observe_same_handle_until_reload() {
    let file = artifact_file(LOGISTIC_ARTIFACT);
    let loader = Arc::new(CountingLoader::new(Duration::ZERO));
    let cache = ModelCache::with_loader(file.path(), loader.clone());

    let first = cache.load(None).unwrap();
    for _ in 0..10 {
        assert!(cache.load(None).unwrap().ptr_eq(&first));
    }
    assert_eq!(loader.load_count(), 1);

    let reloaded = cache.reload(None).unwrap();
    assert_eq!(loader.load_count(), 2);
    assert!(!reloaded.ptr_eq(&first));
    assert!(cache.load(None).unwrap().ptr_eq(&reloaded));
}

#[test]
fn reload_with_explicit_path_wins_over_concurrent_default_loads() {
    let default_file = artifact_file(LOGISTIC_ARTIFACT);
    let requested_file = artifact_file(LOGISTIC_ARTIFACT);
    let requested = requested_file.path().canonicalize().unwrap();

    let loader = Arc::new(CountingLoader::new(Duration::from_millis(20)));
    let cache = Arc::new(ModelCache::with_loader(default_file.path(), loader));
    cache.load(None).unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads + 1));
    let loaders: Vec<_> = (0..threads)
        .map(|_| {
            let cache = cache.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..20 {
                    cache.load(None).expect("load succeeds");
                }
            })
        })
        .collect();

    barrier.wait();
    let reloaded = cache.reload(Some(requested_file.path())).unwrap();
    for handle in loaders {
        handle.join().unwrap();
    }

    let origin = |h: &ModelHandle| h.origin().map(|p| p.canonicalize().unwrap());
    assert_eq!(origin(&reloaded), Some(requested.clone()));
    assert_eq!(origin(&cache.current().unwrap()), Some(requested));
}

#[test]
fn missing_artifact_is_model_load_error() {
    let cache = ModelCache::new("/invalid/path/to/model.json");
    let url = "http://secure123.example.com/a/b";

    let err = cache.load(None).unwrap_err();
    assert!(matches!(err, Error::ModelLoad(_)), "unexpected error: {err:?}");
    assert!(!cache.is_loaded());

    // Feature extraction itself never fails
    let features = extract_features(url);
    assert!(features.digit_ratio_in_host > 0.0);
}

#[test]
fn digits_in_host_drive_local_decision() {
    let file = artifact_file(LOGISTIC_ARTIFACT);
    let cache = ModelCache::new(file.path());
    let handle = cache.load(None).unwrap();
    let classifier = LocalClassifier::new();

    let digit_heavy = extract_features("http://192-168-0-1.example/login99");
    assert!(digit_heavy.digit_ratio_in_host > 0.0);
    let result = classifier.predict(&handle, &digit_heavy).unwrap();
    // z = -2 + 6 * 8/19 + 0.1 * 26/7 + 0.1 * 7 > 0
    assert_eq!(result.decision, Decision::Suspicious);
    assert!(result.score.unwrap() > 0.5);

    let plain = extract_features("https://example.com/");
    let result = classifier.predict(&handle, &plain).unwrap();
    // z = -2 + 0 + 0.1 * 15/3 + 0 < 0
    assert_eq!(result.decision, Decision::Safe);
    assert!(result.score.unwrap() < 0.5);
}

#[test]
fn label_only_artifact_yields_no_score() {
    let file = artifact_file(
        r#"{
            "kind": "decision_tree",
            "root": {
                "feature": 0, "threshold": 0.0,
                "left": {"leaf": 0},
                "right": {"leaf": "phishing"}
            }
        }"#,
    );
    let cache = ModelCache::new(file.path());
    let handle = cache.load(None).unwrap();
    let classifier = LocalClassifier::new();

    let result = classifier
        .predict(&handle, &extract_features("http://a1.example/"))
        .unwrap();
    assert_eq!(result.decision, Decision::Suspicious);
    assert_eq!(result.score, None);

    let result = classifier
        .predict(&handle, &extract_features("http://example.org/"))
        .unwrap();
    assert_eq!(result.decision, Decision::Safe);
    assert_eq!(result.score, None);
}

#[test]
fn test_shipped_artifact() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../model/url_classifier.json");
    let handle = ModelCache::new(path).load(None).unwrap();
    assert!(handle.is_probabilistic());

    let classifier = LocalClassifier::new();
    let digits = classifier
        .predict(&handle, &extract_features("http://192-168-0-1.example/login99"))
        .unwrap();
    assert_eq!(digits.decision, Decision::Suspicious);

    let plain = classifier
        .predict(&handle, &extract_features("https://example.com/login?x="))
        .unwrap();
    assert_eq!(plain.decision, Decision::Safe);
    assert!(plain.score.unwrap() < digits.score.unwrap());
}
