use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bolt_api::models::analysis::LabelScore;
use bolt_api::routes::app_state::AppState;
use bolt_api::services::classifier_service::{ClassifierError, ClassifierLoader, ModelLoader, TextClassifier};
use bolt_api::services::gemini_client::GenerationError;
use bolt_api::services::reply_service::ReplyGenerator;

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Always predicts the same identifier and score, and records every input.
pub struct FixedClassifier {
    pub label: &'static str,
    pub score: f32,
    pub calls: AtomicUsize,
}

impl TextClassifier for FixedClassifier {
    fn classify(&self, _text: &str) -> Result<Vec<LabelScore>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![LabelScore::new(self.label, self.score)])
    }
}

/// Hands out one shared classifier and counts how often it was asked to.
pub struct StubLoader {
    pub classifier: Arc<FixedClassifier>,
    pub loads: AtomicUsize,
    pub failures: usize,
}

impl StubLoader {
    pub fn new(label: &'static str, score: f32) -> Arc<Self> {
        Self::failing_first(label, score, 0)
    }

    pub fn failing_first(label: &'static str, score: f32, failures: usize) -> Arc<Self> {
        Arc::new(StubLoader {
            classifier: Arc::new(FixedClassifier {
                label,
                score,
                calls: AtomicUsize::new(0),
            }),
            loads: AtomicUsize::new(0),
            failures,
        })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn classifications(&self) -> usize {
        self.classifier.calls.load(Ordering::SeqCst)
    }
}

impl ClassifierLoader for StubLoader {
    fn load(&self) -> Result<Arc<dyn TextClassifier>, ClassifierError> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(ClassifierError::LoadError("model weights not found".to_string()));
        }
        Ok(self.classifier.clone())
    }
}

/// Echoes its inputs back so tests can see what reached the generator.
pub struct EchoGenerator;

#[async_trait]
impl ReplyGenerator for EchoGenerator {
    async fn generate_reply(&self, subject: &str, body: &str, label: &str) -> Result<String, GenerationError> {
        Ok(format!("[{}] re: {} / {}", label, subject, body))
    }
}

pub struct FailingGenerator;

#[async_trait]
impl ReplyGenerator for FailingGenerator {
    async fn generate_reply(&self, _subject: &str, _body: &str, _label: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Api("API key not valid".to_string()))
    }
}

pub fn app_state(loader: Arc<StubLoader>, generator: Arc<dyn ReplyGenerator>) -> AppState {
    AppState {
        model_loader: ModelLoader::new(loader),
        reply_generator: generator,
    }
}
