//! Lazily loaded, process-wide model cache
//!
//! The cache owns at most one [`ModelHandle`]. The first successful
//! [`ModelCache::load`] reads the artifact from disk; every later call returns
//! the resident handle until [`ModelCache::reload`] discards it.

use crate::model::{resolve_model_path, ArtifactLoader, ModelHandle, ModelLoader};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use urlguard_core::{Error, Result};

/// Thread-safe holder for the loaded classifier
pub struct ModelCache {
    /// Artifact path used when `load` is called without one
    default_path: PathBuf,

    /// Reads and deserializes artifacts
    loader: Arc<dyn ModelLoader>,

    /// Resident handle, if any
    handle: RwLock<Option<ModelHandle>>,

    /// Serializes loads so concurrent first callers trigger a single read
    load_lock: Mutex<()>,
}

impl ModelCache {
    /// Create an empty cache that loads artifacts from disk
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self::with_loader(default_path, Arc::new(ArtifactLoader))
    }

    /// Create an empty cache with a custom loader
    pub fn with_loader(default_path: impl Into<PathBuf>, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            default_path: default_path.into(),
            loader,
            handle: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Create a cache with a handle already resident
    pub fn with_handle(handle: ModelHandle) -> Self {
        let cache = Self::new(PathBuf::new());
        *cache.handle.write() = Some(handle);
        cache
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// Resident handle without triggering a load
    pub fn current(&self) -> Option<ModelHandle> {
        self.handle.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.read().is_some()
    }

    /// Return the resident handle, loading it first if necessary.
    ///
    /// `path` only matters when nothing is resident. A missing artifact leaves
    /// the cache empty so a later call can retry with a corrected path.
    pub fn load(&self, path: Option<&Path>) -> Result<ModelHandle> {
        if let Some(handle) = self.current() {
            return Ok(handle);
        }

        let resolved = resolve_model_path(path.unwrap_or(&self.default_path));

        let _guard = self.load_lock.lock();
        if let Some(handle) = self.current() {
            return Ok(handle);
        }
        self.load_locked(&resolved)
    }

    /// Discard the resident handle and load again.
    ///
    /// The load lock is held from clearing through installing the new handle,
    /// so a concurrent `load` cannot slip in a model from a different path.
    /// Predictions racing with a reload wait on the lock and then observe the
    /// reloaded handle.
    pub fn reload(&self, path: Option<&Path>) -> Result<ModelHandle> {
        let resolved = resolve_model_path(path.unwrap_or(&self.default_path));

        let _guard = self.load_lock.lock();
        *self.handle.write() = None;
        info!("model cache cleared for reload");
        self.load_locked(&resolved)
    }

    /// Read `resolved` and make it resident. Callers hold `load_lock`.
    fn load_locked(&self, resolved: &Path) -> Result<ModelHandle> {
        if !resolved.exists() {
            warn!(path = %resolved.display(), "model artifact not found");
            return Err(Error::model_load(format!(
                "Model file not found at {}",
                resolved.display()
            )));
        }

        let handle = self.loader.load(resolved)?;
        *self.handle.write() = Some(handle.clone());

        info!(
            path = %resolved.display(),
            model = handle.name(),
            capability = handle.capability().as_str(),
            "model loaded"
        );
        Ok(handle)
    }
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("default_path", &self.default_path)
            .field("handle", &*self.handle.read())
            .finish()
    }
}
