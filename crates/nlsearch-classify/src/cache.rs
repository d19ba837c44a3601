//! Generation-keyed classifier cache.
//!
//! A classifier is trained lazily from a [`CorpusSnapshot`] the first time a
//! query needs it, and then reused until the index publishes a new
//! generation. The trained model is shared read-only behind an `Arc`; a
//! retrain swaps the `Arc` under a write lock.
//!
//! A failed training is remembered for its generation too, so a broken corpus
//! costs one training attempt per commit, not one per query.

use nlsearch_core::{ClassificationResult, ClassifyError, DocumentClassifier, SearchBackend};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{ClassifierConfig, ClassifierKind};

type Model = Arc<dyn DocumentClassifier>;

/// Training outcome for one index generation.
#[derive(Clone)]
struct Trained {
    generation: u64,
    outcome: Result<Model, ClassifyError>,
}

/// Lazily trained, per-generation classifier.
pub struct ClassifierCache {
    config: ClassifierConfig,
    state: RwLock<Option<Trained>>,
}

impl ClassifierCache {
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            state: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.kind != ClassifierKind::None
    }

    /// Generation the cached model (or failure) belongs to.
    pub async fn trained_generation(&self) -> Option<u64> {
        self.state.read().await.as_ref().map(|t| t.generation)
    }

    /// Drop the cached model; the next query retrains.
    pub async fn invalidate(&self) {
        *self.state.write().await = None;
    }

    /// Model for the backend's current generation, training it if needed.
    pub async fn model(&self, backend: &dyn SearchBackend) -> Result<Model, ClassifyError> {
        let generation = backend
            .stats()
            .await
            .map_err(|e| ClassifyError::Backend(e.to_string()))?
            .generation;

        {
            let state = self.state.read().await;
            if let Some(trained) = state.as_ref()
                && trained.generation == generation
            {
                return trained.outcome.clone();
            }
        }

        let mut state = self.state.write().await;
        // Another query may have trained while we waited for the lock.
        if let Some(trained) = state.as_ref()
            && trained.generation == generation
        {
            return trained.outcome.clone();
        }

        let snapshot = backend
            .snapshot()
            .await
            .map_err(|e| ClassifyError::Backend(e.to_string()))?;

        let Some(mut classifier) = self.config.build() else {
            return Err(ClassifyError::TrainingFailed(
                "classification is disabled".to_string(),
            ));
        };

        let outcome = classifier
            .train(&snapshot, &self.config.text_field, &self.config.class_field)
            .map(|()| Model::from(classifier));

        match &outcome {
            Ok(model) => info!(
                "Trained {} classifier on {} documents (generation {})",
                model.name(),
                snapshot.len(),
                snapshot.generation()
            ),
            Err(e) => warn!(
                "Classifier training failed for generation {}: {}",
                snapshot.generation(),
                e
            ),
        }

        *state = Some(Trained {
            generation: snapshot.generation(),
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Predicted document type for `text`.
    ///
    /// Every failure degrades to `None`: a query without a type boost is still
    /// a valid query.
    pub async fn classify(
        &self,
        backend: &dyn SearchBackend,
        text: &str,
    ) -> Option<ClassificationResult> {
        if !self.is_enabled() {
            return None;
        }

        let model = match self.model(backend).await {
            Ok(model) => model,
            Err(e) => {
                debug!("No classification for {:?}: {}", text, e);
                return None;
            }
        };

        match model.assign_class(text) {
            Ok(result) => {
                debug!("Classified {:?} as {:?}", text, result);
                result
            }
            Err(e) => {
                warn!("Classifier {} failed on {:?}: {}", model.name(), text, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for ClassifierCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
