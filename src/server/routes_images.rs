//! Image operation routes.
//!
//! Each route runs one operation through the controller and returns the
//! resulting image as a data URL. Input images arrive as data URLs and are
//! validated here so malformed input is a 400 rather than a service call.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use imageforge_common::{AspectRatio, EncodedImage, ImageOperation};
use serde::{Deserialize, Serialize};

use super::{error_response, AppContext};
use crate::controller::ControllerError;

pub fn image_routes() -> Router<AppContext> {
    Router::new()
        .route("/images/generate", post(generate))
        .route("/images/edit", post(edit))
        .route("/images/merge", post(merge))
        .route("/images/thumbnail", post(thumbnail))
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub prompt: String,
    /// Image to edit; the current session image when absent.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub prompt: String,
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailRequest {
    pub title: String,
    #[serde(default)]
    pub style: Option<String>,
    pub images: Vec<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub operation: ImageOperation,
    pub image_data: EncodedImage,
}

// ============================================================================
// Handlers
// ============================================================================

async fn generate(State(ctx): State<AppContext>, Json(req): Json<GenerateRequest>) -> Response {
    let aspect_ratio = match parse_aspect_ratio(req.aspect_ratio.as_deref()) {
        Ok(ratio) => ratio.unwrap_or_default(),
        Err(e) => return error_response(e),
    };
    respond(
        ImageOperation::Generate,
        ctx.controller.generate(&req.prompt, aspect_ratio).await,
    )
}

async fn edit(State(ctx): State<AppContext>, Json(req): Json<EditRequest>) -> Response {
    let image = match req.image.as_deref().map(parse_image).transpose() {
        Ok(image) => image,
        Err(e) => return error_response(e),
    };
    respond(
        ImageOperation::Edit,
        ctx.controller.edit(&req.prompt, image).await,
    )
}

async fn merge(State(ctx): State<AppContext>, Json(req): Json<MergeRequest>) -> Response {
    let images = match parse_images(&req.images) {
        Ok(images) => images,
        Err(e) => return error_response(e),
    };
    respond(
        ImageOperation::Merge,
        ctx.controller.merge(&req.prompt, images).await,
    )
}

async fn thumbnail(State(ctx): State<AppContext>, Json(req): Json<ThumbnailRequest>) -> Response {
    let (images, aspect_ratio) = match (
        parse_images(&req.images),
        parse_aspect_ratio(req.aspect_ratio.as_deref()),
    ) {
        (Ok(images), Ok(aspect_ratio)) => (images, aspect_ratio),
        (Err(e), _) | (_, Err(e)) => return error_response(e),
    };
    respond(
        ImageOperation::Thumbnail,
        ctx.controller
            .thumbnail(&req.title, req.style.as_deref(), images, aspect_ratio)
            .await,
    )
}

fn respond(operation: ImageOperation, result: Result<EncodedImage, ControllerError>) -> Response {
    match result {
        Ok(image_data) => Json(ImageResponse {
            operation,
            image_data,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

fn parse_image(data_url: &str) -> Result<EncodedImage, ControllerError> {
    EncodedImage::parse(data_url).map_err(|e| ControllerError::Invalid(e.to_string()))
}

fn parse_images(data_urls: &[String]) -> Result<Vec<EncodedImage>, ControllerError> {
    data_urls.iter().map(|url| parse_image(url)).collect()
}

fn parse_aspect_ratio(value: Option<&str>) -> Result<Option<AspectRatio>, ControllerError> {
    value
        .map(|v| v.parse::<AspectRatio>())
        .transpose()
        .map_err(|e| ControllerError::Invalid(e.to_string()))
}
