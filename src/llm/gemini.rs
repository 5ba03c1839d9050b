//! Gemini chat model implementation.

use super::ChatModel;
use crate::error::{PratError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Chat model backed by the Gemini generateContent API.
pub struct GeminiChatModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: SystemInstruction,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
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
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiChatModel {
    /// Create a model handle for the given model name.
    pub fn new(api_key: &str, model: &str, temperature: f32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
        }
    }

    fn parse_response(body: &str) -> Result<String> {
        let response: GenerateResponse = serde_json::from_str(body)
            .map_err(|e| PratError::Gemini(format!("Unparseable response: {}", e)))?;

        if let Some(error) = response.error {
            return Err(PratError::Gemini(error.message));
        }

        let candidate = response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .ok_or_else(|| PratError::Gemini("Response contained no candidates".to_string()))?;

        match candidate.content.as_ref().and_then(|c| c.parts.first()) {
            Some(part) => Ok(part.text.clone()),
            None => {
                let reason = candidate.finish_reason.as_deref().unwrap_or("UNKNOWN");
                Err(PratError::Gemini(format!(
                    "Candidate contained no text (finish reason: {})",
                    reason
                )))
            }
        }
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: user.to_string(),
                }],
            }],
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PratError::Gemini(format!("API error: {}", body)));
        }

        let body = response.text().await?;
        Self::parse_response(&body)
    }
}
