//! Client for Gemini-style `generateContent` image models.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use imageforge_common::EncodedImage;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ImageRequest, ImageService, ServiceError};
use crate::config::ImageServiceConfig;

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiBlob,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiBlob {
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<&'static str>,
    #[serde(rename = "imageConfig", skip_serializing_if = "Option::is_none")]
    image_config: Option<GeminiImageConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiImageConfig {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "inlineData", default)]
    inline_data: Option<GeminiBlob>,
}

#[derive(Debug, Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason", default)]
    block_reason: Option<String>,
}

/// Image service backed by a Gemini image model.
pub struct GeminiImageClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: HttpClient,
}

impl GeminiImageClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url: base_url.into(),
            model: model.into(),
            client,
        })
    }

    pub fn from_config(config: &ImageServiceConfig) -> Result<Self, ServiceError> {
        Self::new(
            config.resolve_api_key(),
            config.base_url.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

fn build_request(request: &ImageRequest) -> GeminiRequest {
    let mut parts = vec![GeminiRequestPart::Text {
        text: request.prompt.clone(),
    }];
    parts.extend(request.inputs.iter().map(|image| GeminiRequestPart::InlineData {
        inline_data: GeminiBlob {
            mime_type: Some(image.mime_type().to_string()),
            data: image.base64_data().to_string(),
        },
    }));

    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts,
        }],
        generation_config: GeminiGenerationConfig {
            response_modalities: vec!["IMAGE"],
            image_config: request.aspect_ratio.map(|ratio| GeminiImageConfig {
                aspect_ratio: ratio.to_string(),
            }),
        },
    }
}

fn image_from_blob(blob: GeminiBlob) -> Result<EncodedImage, ServiceError> {
    match blob.mime_type.filter(|mime| mime.starts_with("image/")) {
        Some(mime) => EncodedImage::from_base64(mime, blob.data)
            .map_err(|e| ServiceError::Decode(e.to_string())),
        None => {
            // Untyped payload: fall back to the file signature.
            let bytes = STANDARD
                .decode(&blob.data)
                .map_err(|e| ServiceError::Decode(e.to_string()))?;
            EncodedImage::sniff(&bytes)
                .ok_or_else(|| ServiceError::Decode("unrecognized image bytes".to_string()))
        }
    }
}

fn extract_image(status: StatusCode, response: GeminiResponse) -> Result<EncodedImage, ServiceError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ServiceError::Rejected {
            status: status.as_u16(),
            details: format!("prompt blocked: {}", reason),
        });
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ServiceError::EmptyResult);
    };

    let finish_reason = candidate.finish_reason;
    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

    let mut text = Vec::new();
    for part in parts {
        if let Some(blob) = part.inline_data {
            return image_from_blob(blob);
        }
        if let Some(t) = part.text {
            text.push(t);
        }
    }

    if !text.is_empty() {
        tracing::warn!("Image service answered with text only: {}", text.join(" "));
    }
    match finish_reason {
        Some(reason)
            if matches!(
                reason.as_str(),
                "SAFETY" | "PROHIBITED_CONTENT" | "IMAGE_SAFETY"
            ) =>
        {
            Err(ServiceError::Rejected {
                status: status.as_u16(),
                details: format!("generation stopped: {}", reason),
            })
        }
        _ => Err(ServiceError::EmptyResult),
    }
}

#[async_trait]
impl ImageService for GeminiImageClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<EncodedImage, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or(ServiceError::MissingApiKey)?;
        let body = build_request(request);

        tracing::debug!(
            model = %self.model,
            inputs = request.inputs.len(),
            aspect_ratio = ?request.aspect_ratio,
            "Sending image request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let details = response.text().await?;
            tracing::error!("Image service error response. Status: {}, Body: {}", status, details);
            return Err(match status.as_u16() {
                401 | 403 => ServiceError::Authentication { details },
                429 => ServiceError::RateLimited { details },
                code => ServiceError::Rejected {
                    status: code,
                    details,
                },
            });
        }

        let text = response.text().await?;
        let parsed: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| ServiceError::Decode(e.to_string()))?;

        let image = extract_image(status, parsed)?;
        tracing::info!(
            mime_type = image.mime_type(),
            "Image service returned an image"
        );
        Ok(image)
    }
}
