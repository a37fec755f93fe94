use std::sync::Arc;

use crate::services::classifier_service::ModelLoader;
use crate::services::reply_service::ReplyGenerator;

#[derive(Clone)]
pub struct AppState {
    pub model_loader: ModelLoader,
    pub reply_generator: Arc<dyn ReplyGenerator>,
}
