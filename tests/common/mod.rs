//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires an in-memory gallery, default config,
//! and a scripted [`FakeImageService`] into a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, Router};
use http_body_util::BodyExt;
use imageforge::config::Config;
use imageforge::controller::AppController;
use imageforge::server::{create_router, AppContext};
use imageforge::service::{ImageRequest, ImageService, ServiceError};
use imageforge_common::EncodedImage;
use imageforge_db::store::GalleryStore;
use parking_lot::Mutex;
use tokio::sync::Notify;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A tiny PNG-signed image; different tags give different images.
pub fn png(tag: u8) -> EncodedImage {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(b"\0\0\0\rIHDR");
    bytes.push(tag);
    EncodedImage::from_bytes("image/png", &bytes)
}

/// Holds an in-flight request until released.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

/// Image service double returning scripted results.
///
/// Scripted results are consumed in order; once exhausted every request
/// succeeds with `png(0)`.
#[derive(Default)]
pub struct FakeImageService {
    responses: Mutex<VecDeque<Result<EncodedImage, ServiceError>>>,
    requests: Mutex<Vec<ImageRequest>>,
    gate: Option<Arc<Gate>>,
}

impl FakeImageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that blocks each request on `gate`.
    pub fn gated(gate: Arc<Gate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_image(&self, image: EncodedImage) {
        self.responses.lock().push_back(Ok(image));
    }

    pub fn push_error(&self, error: ServiceError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ImageService for FakeImageService {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<EncodedImage, ServiceError> {
        self.requests.lock().push(request.clone());

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let next = self.responses.lock().pop_front();
        next.unwrap_or_else(|| Ok(png(0)))
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory gallery.
pub struct TestHarness {
    pub ctx: AppContext,
    pub service: Arc<FakeImageService>,
}

impl TestHarness {
    /// Create a new harness with default configuration and in-memory gallery.
    pub fn new() -> Self {
        Self::with_parts(GalleryStore::in_memory(), FakeImageService::new())
    }

    /// Create a harness from a specific store and service.
    pub fn with_parts(store: GalleryStore, service: FakeImageService) -> Self {
        let service = Arc::new(service);
        let controller = Arc::new(AppController::new(
            Arc::new(store),
            service.clone() as Arc<dyn ImageService>,
        ));

        let ctx = AppContext {
            config: Arc::new(Config::default()),
            controller,
        };

        Self { ctx, service }
    }

    pub fn controller(&self) -> &Arc<AppController> {
        &self.ctx.controller
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone(), None)
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = harness.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

/// Collect a response body as JSON.
pub async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}
