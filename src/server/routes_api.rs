use crate::server::AppContext;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/session", get(session))
}

async fn health(State(ctx): State<AppContext>) -> impl IntoResponse {
    let gallery = match ctx.controller.store().count().await {
        Ok(count) => serde_json::json!({"status": "ok", "images": count}),
        Err(e) => {
            tracing::warn!("Gallery health check failed: {}", e);
            serde_json::json!({"status": "unavailable"})
        }
    };

    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "model": ctx.config.image_service.model,
        "gallery": gallery,
    }))
}

async fn session(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.controller.session())
}
