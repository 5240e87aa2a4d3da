use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;

use crate::application::ports::{SpeechModel, SpeechModelError, SpeechModelLoader};
use crate::domain::{ComputeBackend, ModelSize};

/// Process-wide cache of loaded speech models, keyed by size.
///
/// The compute backend starts out accelerated and is downgraded to generic,
/// once and for good, the first time a load fails. Cold loads are serialized
/// behind the backend lock, so a size is never initialized twice and every
/// load observes a settled backend decision. Cached models stay valid after a
/// downgrade; only sizes loaded afterwards use the generic backend.
pub struct ModelCache {
    loader: Arc<dyn SpeechModelLoader>,
    models: RwLock<HashMap<ModelSize, Arc<dyn SpeechModel>>>,
    backend: Mutex<ComputeBackend>,
}

impl ModelCache {
    pub fn new(loader: Arc<dyn SpeechModelLoader>) -> Self {
        Self::with_backend(loader, ComputeBackend::Accelerated)
    }

    pub fn with_backend(loader: Arc<dyn SpeechModelLoader>, backend: ComputeBackend) -> Self {
        Self {
            loader,
            models: RwLock::new(HashMap::new()),
            backend: Mutex::new(backend),
        }
    }

    /// Current backend. Waits for an in-flight cold load to finish.
    pub async fn backend(&self) -> ComputeBackend {
        *self.backend.lock().await
    }

    pub fn is_cached(&self, size: ModelSize) -> bool {
        self.cached(size).is_some()
    }

    pub async fn acquire(
        &self,
        size: ModelSize,
    ) -> Result<Arc<dyn SpeechModel>, ModelCacheError> {
        if let Some(model) = self.cached(size) {
            return Ok(model);
        }

        let mut backend = self.backend.lock().await;

        // Another request may have finished loading this size while we waited.
        if let Some(model) = self.cached(size) {
            return Ok(model);
        }

        let model = match self.load(size, *backend).await {
            Ok(model) => model,
            Err(e) if *backend == ComputeBackend::Accelerated => {
                tracing::warn!(
                    error = %e,
                    model_size = %size,
                    "Accelerated model load failed, switching to generic backend"
                );
                *backend = ComputeBackend::Generic;
                self.load(size, *backend).await.map_err(|source| {
                    tracing::error!(
                        error = %source,
                        model_size = %size,
                        "Generic model load failed"
                    );
                    ModelCacheError::LoadFailed { size, source }
                })?
            }
            Err(source) => {
                tracing::error!(error = %source, model_size = %size, "Generic model load failed");
                return Err(ModelCacheError::LoadFailed { size, source });
            }
        };

        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(size, Arc::clone(&model));

        tracing::info!(model_size = %size, backend = backend.as_str(), "Speech model cached");

        Ok(model)
    }

    fn cached(&self, size: ModelSize) -> Option<Arc<dyn SpeechModel>> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&size)
            .cloned()
    }

    async fn load(
        &self,
        size: ModelSize,
        backend: ComputeBackend,
    ) -> Result<Arc<dyn SpeechModel>, SpeechModelError> {
        let precision = backend.precision();
        tracing::info!(
            model_size = %size,
            backend = %backend,
            precision = %precision,
            "Loading speech model"
        );

        let loader = Arc::clone(&self.loader);
        tokio::task::spawn_blocking(move || loader.load(size, backend, precision))
            .await
            .map_err(|e| SpeechModelError::ModelLoadFailed(format!("loader task: {}", e)))?
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelCacheError {
    #[error("failed to load '{size}' model: {source}")]
    LoadFailed {
        size: ModelSize,
        source: SpeechModelError,
    },
}
