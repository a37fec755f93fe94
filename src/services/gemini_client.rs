//! Minimal client for Gemini's `generateContent` endpoint.

use std::time::Duration;

use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request to generation API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation API error: {0}")]
    Api(String),

    #[error("generation API returned no text{0}")]
    EmptyResponse(String),
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    #[serde(rename = "systemInstruction")]
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiClient {
    pub fn new(
        api_base: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(GeminiClient {
            client,
            api_base: api_base.into(),
            model: model.into(),
            api_key,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GenerationError> {
        Self::new(
            config.gemini_api_base.clone(),
            config.gemini_model.clone(),
            config.gemini_key.clone(),
            config.gemini_timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    /// Sends one system instruction plus one user turn and returns the generated text.
    pub async fn generate(&self, system_instruction: &str, user_content: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![TextPart { text: system_instruction }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![TextPart { text: user_content }],
            }],
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-goog-api-key", key);
        }

        info!("Requesting reply from {}", self.model);
        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let response: GenerateResponse = response.json().await?;
        if let Some(error) = response.error {
            return Err(GenerationError::Api(error.message));
        }

        let candidate = response.candidates.and_then(|c| c.into_iter().next());
        let text: String = candidate
            .as_ref()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate
                .and_then(|c| c.finish_reason)
                .or_else(|| response.prompt_feedback.and_then(|f| f.block_reason))
                .map(|reason| format!(" ({})", reason))
                .unwrap_or_default();
            return Err(GenerationError::EmptyResponse(reason));
        }

        Ok(text)
    }
}
