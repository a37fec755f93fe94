use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info};
use tokio::sync::OnceCell;

use crate::config::AppConfig;
use crate::models::analysis::LabelScore;
use crate::services::pipeline::TextClassificationPipeline;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Model loading failed: {0}")]
    LoadError(String),

    #[error("Classification failed: {0}")]
    InferenceError(String),
}

/// Anything that can turn email text into label predictions.
pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Vec<LabelScore>, ClassifierError>;
}

/// Builds a classifier. Called from the blocking pool, so it may do disk and network I/O.
pub trait ClassifierLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn TextClassifier>, ClassifierError>;
}

impl TextClassifier for TextClassificationPipeline {
    fn classify(&self, text: &str) -> Result<Vec<LabelScore>, ClassifierError> {
        TextClassificationPipeline::classify(self, text)
            .map_err(|e| ClassifierError::InferenceError(format!("{:#}", e)))
    }
}

/// Loads the fine-tuned model from the Hub (or a local directory) on the CPU.
pub struct PretrainedLoader {
    model_id: String,
    cache_dir: PathBuf,
}

impl PretrainedLoader {
    pub fn new(model_id: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        PretrainedLoader {
            model_id: model_id.into(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.model_id.clone(), config.model_cache_dir.clone())
    }
}

impl ClassifierLoader for PretrainedLoader {
    fn load(&self) -> Result<Arc<dyn TextClassifier>, ClassifierError> {
        let pipeline = TextClassificationPipeline::load(&self.model_id, &self.cache_dir)
            .map_err(|e| ClassifierError::LoadError(format!("{:#}", e)))?;
        Ok(Arc::new(pipeline))
    }
}

/// Process-wide, lazily initialised classifier handle.
///
/// The first caller of [`ModelLoader::ensure_loaded`] runs the loader; concurrent
/// callers wait for that same load. A failed load leaves the cell empty so the
/// next request tries again.
#[derive(Clone)]
pub struct ModelLoader {
    loader: Arc<dyn ClassifierLoader>,
    classifier: Arc<OnceCell<Arc<dyn TextClassifier>>>,
}

impl ModelLoader {
    pub fn new(loader: Arc<dyn ClassifierLoader>) -> Self {
        ModelLoader {
            loader,
            classifier: Arc::new(OnceCell::new()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.initialized()
    }

    pub async fn ensure_loaded(&self) -> Result<Arc<dyn TextClassifier>, ClassifierError> {
        let classifier = self
            .classifier
            .get_or_try_init(|| async {
                info!("Loading AI model...");
                let loader = Arc::clone(&self.loader);
                let loaded = tokio::task::spawn_blocking(move || loader.load())
                    .await
                    .map_err(|e| ClassifierError::LoadError(format!("loader task failed: {}", e)))
                    .and_then(|result| result);
                match &loaded {
                    Ok(_) => info!("AI model loaded successfully"),
                    Err(e) => error!("Error loading model: {}", e),
                }
                loaded
            })
            .await?;
        Ok(Arc::clone(classifier))
    }

    /// Classifies `text`, loading the model first if needed.
    pub async fn classify(&self, text: String) -> Result<Vec<LabelScore>, ClassifierError> {
        let classifier = self.ensure_loaded().await?;
        tokio::task::spawn_blocking(move || classifier.classify(&text))
            .await
            .map_err(|e| ClassifierError::InferenceError(format!("classifier task failed: {}", e)))?
    }
}
