use serde::Deserialize;
use serde_json::Value;

/// Payload accepted by `POST /analyze-label`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EmailRequestError {
    #[error("Invalid email payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl EmailRequest {
    /// Validates a raw JSON payload. Anything without a string `body` is rejected.
    // A null or non-string `body`/`subject` is a client error here (400), not a 500.
    pub fn from_payload(payload: Value) -> Result<Self, EmailRequestError> {
        Ok(serde_json::from_value(payload)?)
    }

    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }

    /// Text fed to the classifier: subject and body joined by a single space.
    pub fn classification_text(&self) -> String {
        format!("{} {}", self.subject(), self.body)
    }
}
