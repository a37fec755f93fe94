use serde::{Deserialize, Serialize};

use crate::models::label::remap_label;

/// One classifier prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        LabelScore { label: label.into(), score }
    }

    /// Replaces the raw identifier with its display name.
    pub fn remapped(self) -> Self {
        LabelScore {
            label: remap_label(&self.label),
            score: self.score,
        }
    }
}

/// Successful `/analyze-label` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub result: Vec<LabelScore>,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Error")]
    pub error: String,
}

impl ErrorResponse {
    pub const NO_TEXT: &'static str = "No text provided";
    pub const TOO_LARGE: &'static str = "Request body too large";

    pub fn new(error: impl Into<String>) -> Self {
        ErrorResponse { error: error.into() }
    }

    pub fn no_text() -> Self {
        ErrorResponse::new(Self::NO_TEXT)
    }

    pub fn too_large() -> Self {
        ErrorResponse::new(Self::TOO_LARGE)
    }
}
