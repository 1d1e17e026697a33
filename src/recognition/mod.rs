//! Food recognition
//!
//! The vision step is a capability the controller depends on. Implementations
//! turn an image into a food label plus confidence; nothing here knows about
//! emission factors.

pub mod demo;
pub mod gemini;
pub mod parse;
pub mod prompt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use demo::DemoRecognizer;
pub use gemini::GeminiRecognizer;
pub use parse::{adjust_for_known_weight, extract_json, parse_response};
pub use prompt::build_prompt;

/// Recognition errors
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("API returned an empty response")]
    EmptyResponse,

    #[error("No API key configured")]
    MissingApiKey,
}

impl RecognitionError {
    /// Transport failures, rate limiting and server errors may succeed on a
    /// second try; client errors and bad input will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            RecognitionError::Http(_) => true,
            RecognitionError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Input to a recognizer
#[derive(Debug, Clone, Default)]
pub struct RecognitionRequest {
    /// Encoded image bytes (JPEG, PNG, ...)
    pub image: Vec<u8>,
    /// Measured weight, if a scale reading is available
    pub known_weight_grams: Option<f64>,
    /// Free-text hint for the model
    pub context: Option<String>,
}

/// What a recognizer saw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recognition {
    pub food_name: String,
    /// Category as reported by the model, not validated
    pub category: String,
    /// Always within 0..=1
    pub confidence: f64,
    pub description: String,
    pub estimated_weight_grams: Option<f64>,
    pub ingredients: Vec<String>,
    pub processing_ms: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw_response: String,
}

/// Image-to-label capability
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Short name for logs and status output
    fn name(&self) -> &'static str;

    async fn recognize(&self, request: &RecognitionRequest) -> Result<Recognition, RecognitionError>;
}
