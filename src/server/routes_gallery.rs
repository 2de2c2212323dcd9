//! Gallery API routes.
//!
//! Listing, saving, fetching, serving, loading, and deleting saved images.
//! Saves go through the controller so duplicate images are not stored twice.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use imageforge_common::{EncodedImage, GalleryImageId};
use serde::Deserialize;

use super::{error_response, AppContext};
use crate::controller::{ControllerError, SaveOutcome};

pub fn gallery_routes() -> Router<AppContext> {
    Router::new()
        .route("/gallery", get(list_gallery).post(save_image))
        .route("/gallery/save-current", post(save_current))
        .route("/gallery/:id", get(get_gallery_image).delete(delete_gallery_image))
        .route("/gallery/:id/raw", get(serve_gallery_image))
        .route("/gallery/:id/load", post(load_gallery_image))
}

#[derive(Debug, Deserialize)]
pub struct SaveImageRequest {
    pub image_data: String,
}

async fn list_gallery(State(ctx): State<AppContext>) -> Response {
    match ctx.controller.gallery().await {
        Ok(images) => Json(images).into_response(),
        Err(e) => error_response(e),
    }
}

async fn save_image(
    State(ctx): State<AppContext>,
    Json(req): Json<SaveImageRequest>,
) -> Response {
    let image = match EncodedImage::parse(&req.image_data) {
        Ok(image) => image,
        Err(e) => return error_response(ControllerError::Invalid(e.to_string())),
    };

    save_response(ctx.controller.save(&image).await)
}

async fn save_current(State(ctx): State<AppContext>) -> Response {
    save_response(ctx.controller.save_current().await)
}

fn save_response(result: Result<SaveOutcome, ControllerError>) -> Response {
    match result {
        Ok(outcome) => {
            let status = if outcome.is_duplicate() {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            (
                status,
                Json(serde_json::json!({
                    "id": outcome.id(),
                    "duplicate": outcome.is_duplicate(),
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn get_gallery_image(State(ctx): State<AppContext>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };

    match ctx.controller.gallery_image(id).await {
        Ok(image) => Json(image).into_response(),
        Err(e) => error_response(e),
    }
}

/// Serve the decoded image bytes with the stored MIME type.
async fn serve_gallery_image(State(ctx): State<AppContext>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };

    let record = match ctx.controller.gallery_image(id).await {
        Ok(record) => record,
        Err(e) => return error_response(e),
    };

    let decoded = EncodedImage::parse(&record.image_data)
        .and_then(|image| image.decode().map(|bytes| (image, bytes)));
    let (image, bytes) = match decoded {
        Ok(decoded) => decoded,
        Err(e) => return error_response(e.into()),
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, image.mime_type().to_string()),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn load_gallery_image(State(ctx): State<AppContext>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };

    match ctx.controller.load_from_gallery(id).await {
        Ok(_) => Json(ctx.controller.session()).into_response(),
        Err(e) => error_response(e),
    }
}

async fn delete_gallery_image(State(ctx): State<AppContext>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };

    match ctx.controller.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

fn parse_id(raw: &str) -> Result<GalleryImageId, ControllerError> {
    raw.parse::<GalleryImageId>()
        .map_err(|_| ControllerError::Invalid(format!("Invalid gallery image id '{}'", raw)))
}
