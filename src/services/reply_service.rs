use async_trait::async_trait;
use log::error;

use crate::config::SYSTEM_PROMPT;
use crate::services::gemini_client::{GeminiClient, GenerationError};

/// Drafts a reply to a classified email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate_reply(&self, subject: &str, body: &str, label: &str) -> Result<String, GenerationError>;
}

#[async_trait]
impl ReplyGenerator for GeminiClient {
    async fn generate_reply(&self, subject: &str, body: &str, label: &str) -> Result<String, GenerationError> {
        self.generate(SYSTEM_PROMPT, &build_reply_prompt(subject, body, label)).await
    }
}

pub fn build_reply_prompt(subject: &str, body: &str, label: &str) -> String {
    format!("Subject: {}\nBody: {}\nLabel: {}", subject, body, label)
}

/// Asks the generator for a reply. Failures come back as text so the caller still
/// gets its classification.
pub async fn draft_reply(generator: &dyn ReplyGenerator, subject: &str, body: &str, label: &str) -> String {
    match generator.generate_reply(subject, body, label).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Error generating response: {}", e);
            format!("Error generating response: {}", e)
        }
    }
}
