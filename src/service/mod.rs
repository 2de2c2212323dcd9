//! Hosted image service collaborator.
//!
//! The controller talks to the image API only through [`ImageService`], so
//! tests and alternative providers can be substituted.

mod gemini;

pub use gemini::GeminiImageClient;

use async_trait::async_trait;
use imageforge_common::{AspectRatio, EncodedImage};

/// A single request to the image service.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub inputs: Vec<EncodedImage>,
    pub aspect_ratio: Option<AspectRatio>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            inputs: Vec::new(),
            aspect_ratio: None,
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<EncodedImage>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(aspect_ratio);
        self
    }
}

/// Failures reported by an image service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("No API key configured for the image service")]
    MissingApiKey,

    #[error("Image service rejected the API key: {details}")]
    Authentication { details: String },

    #[error("Image service rate limit reached: {details}")]
    RateLimited { details: String },

    #[error("Image service rejected the request ({status}): {details}")]
    Rejected { status: u16, details: String },

    #[error("Image service returned no image")]
    EmptyResult,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Could not decode image service response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ImageService: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &'static str;

    /// Run one request and return the produced image.
    async fn generate_image(&self, request: &ImageRequest) -> Result<EncodedImage, ServiceError>;
}
