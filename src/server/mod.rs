use crate::config::Config;
use crate::controller::{AppController, ControllerError};
use crate::service::ServiceError;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use imageforge_common::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod routes_api;
pub mod routes_gallery;
pub mod routes_images;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub controller: Arc<AppController>,
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let api = routes_api::api_routes()
        .merge(routes_images::image_routes())
        .merge(routes_gallery::gallery_routes());

    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // SPA fallback: serves index.html for any route that doesn't match a file
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        }
    }

    app
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Map a controller failure onto an HTTP status and `{ "error": ... }` body.
pub(crate) fn error_response(err: ControllerError) -> Response {
    let status = match &err {
        ControllerError::Invalid(_) | ControllerError::NothingToSave => StatusCode::BAD_REQUEST,
        ControllerError::Busy => StatusCode::CONFLICT,
        ControllerError::Gallery(Error::Initialization(_)) => StatusCode::SERVICE_UNAVAILABLE,
        ControllerError::Gallery(Error::NotFound(_)) => StatusCode::NOT_FOUND,
        ControllerError::Gallery(Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
        ControllerError::Gallery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ControllerError::Service(ServiceError::MissingApiKey) => StatusCode::SERVICE_UNAVAILABLE,
        ControllerError::Service(_) => StatusCode::BAD_GATEWAY,
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    }

    (
        status,
        Json(serde_json::json!({"error": err.user_message()})),
    )
        .into_response()
}

/// Start the HTTP server
pub async fn start_server(config: Config, controller: Arc<AppController>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let static_dir = config.server.static_dir.clone();
    let ctx = AppContext {
        config: Arc::new(config),
        controller,
    };

    let app = create_router(ctx, static_dir);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
