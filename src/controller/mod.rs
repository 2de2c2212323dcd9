//! Application controller.
//!
//! Orchestrates user actions: runs image operations through the image
//! service, keeps the transient session state, and saves results to the
//! gallery. Session state only changes when an operation succeeds.

pub mod prompts;
mod session;

pub use session::SessionState;

use std::sync::Arc;

use chrono::Utc;
use imageforge_common::{AspectRatio, EncodedImage, Error, GalleryImageId, ImageOperation};
use imageforge_db::models::GalleryImage;
use imageforge_db::store::GalleryStore;
use parking_lot::RwLock;
use serde::Serialize;

use crate::service::{ImageRequest, ImageService, ServiceError};
use session::BusyGuard;

/// Errors surfaced by controller operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("{0}")]
    Invalid(String),

    #[error("Another image operation is already running")]
    Busy,

    #[error("There is no image to save")]
    NothingToSave,

    #[error(transparent)]
    Gallery(#[from] Error),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ControllerError {
    fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(msg) => msg.clone(),
            Self::Busy => "Please wait for the current image to finish.".to_string(),
            Self::NothingToSave => "Generate or load an image before saving.".to_string(),
            Self::Gallery(Error::Initialization(_)) => "Gallery unavailable.".to_string(),
            Self::Gallery(Error::Read(_)) => "Could not load the gallery.".to_string(),
            Self::Gallery(Error::Write(_)) => "Could not update the gallery.".to_string(),
            Self::Gallery(Error::NotFound(_)) => "That image is no longer in the gallery.".to_string(),
            Self::Gallery(Error::InvalidInput(msg)) => msg.clone(),
            Self::Service(ServiceError::MissingApiKey) => {
                "No API key is configured for the image service.".to_string()
            }
            Self::Service(ServiceError::Authentication { .. }) => {
                "The image service rejected the API key.".to_string()
            }
            Self::Service(ServiceError::RateLimited { .. }) => {
                "The image service is busy. Try again in a moment.".to_string()
            }
            Self::Service(ServiceError::EmptyResult) => {
                "The image service did not return an image. Try rephrasing the prompt.".to_string()
            }
            Self::Service(e) => format!("Image generation failed: {}", e),
        }
    }
}

/// Result of a gallery save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "id", rename_all = "lowercase")]
pub enum SaveOutcome {
    /// A new record was written.
    Saved(GalleryImageId),
    /// An identical image was already saved under this id; nothing was written.
    Duplicate(GalleryImageId),
}

impl SaveOutcome {
    pub fn id(self) -> GalleryImageId {
        match self {
            Self::Saved(id) | Self::Duplicate(id) => id,
        }
    }

    pub fn is_duplicate(self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

pub struct AppController {
    store: Arc<GalleryStore>,
    service: Arc<dyn ImageService>,
    session: RwLock<SessionState>,
    /// Held across the duplicate check and the insert.
    save_lock: tokio::sync::Mutex<()>,
}

impl AppController {
    pub fn new(store: Arc<GalleryStore>, service: Arc<dyn ImageService>) -> Self {
        Self {
            store,
            service,
            session: RwLock::new(SessionState::default()),
            save_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<GalleryStore> {
        &self.store
    }

    /// Snapshot of the session state.
    pub fn session(&self) -> SessionState {
        self.session.read().clone()
    }

    /// Text-to-image generation.
    pub async fn generate(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<EncodedImage, ControllerError> {
        let prompt = require_text(prompt, "prompt")?;
        let request = ImageRequest::new(prompt.clone()).with_aspect_ratio(aspect_ratio);
        self.run_operation(ImageOperation::Generate, prompt, Some(aspect_ratio), request)
            .await
    }

    /// Edit one image. Without an explicit image the current result is edited.
    pub async fn edit(
        &self,
        instruction: &str,
        image: Option<EncodedImage>,
    ) -> Result<EncodedImage, ControllerError> {
        let instruction = require_text(instruction, "edit instruction")?;
        let image = match image {
            Some(image) => image,
            None => self
                .session
                .read()
                .current
                .clone()
                .ok_or_else(|| ControllerError::invalid("Provide an image to edit."))?,
        };

        let request = ImageRequest::new(prompts::edit_prompt(&instruction)).with_inputs(vec![image]);
        self.run_operation(ImageOperation::Edit, instruction, None, request)
            .await
    }

    /// Combine two or more images.
    pub async fn merge(
        &self,
        instruction: &str,
        images: Vec<EncodedImage>,
    ) -> Result<EncodedImage, ControllerError> {
        let instruction = require_text(instruction, "merge instruction")?;
        if images.len() < 2 {
            return Err(ControllerError::invalid("Merging needs at least two images."));
        }

        let request = ImageRequest::new(prompts::merge_prompt(&instruction, images.len()))
            .with_inputs(images);
        self.run_operation(ImageOperation::Merge, instruction, None, request)
            .await
    }

    /// Compose a titled thumbnail from one or more images (16:9 unless specified).
    pub async fn thumbnail(
        &self,
        title: &str,
        style: Option<&str>,
        images: Vec<EncodedImage>,
        aspect_ratio: Option<AspectRatio>,
    ) -> Result<EncodedImage, ControllerError> {
        let title = require_text(title, "thumbnail title")?;
        if images.is_empty() {
            return Err(ControllerError::invalid("A thumbnail needs at least one image."));
        }
        let aspect_ratio = aspect_ratio.unwrap_or(AspectRatio::Landscape);

        let request = ImageRequest::new(prompts::thumbnail_prompt(&title, style, images.len()))
            .with_inputs(images)
            .with_aspect_ratio(aspect_ratio);
        self.run_operation(ImageOperation::Thumbnail, title, Some(aspect_ratio), request)
            .await
    }

    async fn run_operation(
        &self,
        operation: ImageOperation,
        prompt: String,
        aspect_ratio: Option<AspectRatio>,
        request: ImageRequest,
    ) -> Result<EncodedImage, ControllerError> {
        let _busy = BusyGuard::acquire(&self.session)?;

        tracing::info!(
            %operation,
            service = self.service.name(),
            inputs = request.inputs.len(),
            "Running image operation"
        );

        let image = self
            .service
            .generate_image(&request)
            .await
            .inspect_err(|e| tracing::warn!(%operation, "Image operation failed: {}", e))?;

        {
            let mut session = self.session.write();
            session.prompt = prompt;
            if let Some(aspect_ratio) = aspect_ratio {
                session.aspect_ratio = aspect_ratio;
            }
            session.current = Some(image.clone());
            session.last_operation = Some(operation);
            session.updated_at = Some(Utc::now());
        }

        Ok(image)
    }

    /// Save the current image to the gallery.
    pub async fn save_current(&self) -> Result<SaveOutcome, ControllerError> {
        let current = self
            .session
            .read()
            .current
            .clone()
            .ok_or(ControllerError::NothingToSave)?;
        self.save(&current).await
    }

    /// Save an image unless an identical one is already in the gallery.
    pub async fn save(&self, image: &EncodedImage) -> Result<SaveOutcome, ControllerError> {
        let image_data = image.to_data_url();
        let _saving = self.save_lock.lock().await;

        if let Some(id) = self.store.find(image_data.as_str()).await? {
            tracing::debug!(%id, "Image already in gallery, not saving again");
            return Ok(SaveOutcome::Duplicate(id));
        }

        let id = self.store.add(image_data).await?;
        tracing::info!(%id, "Saved image to gallery");
        Ok(SaveOutcome::Saved(id))
    }

    /// All saved images, newest first.
    pub async fn gallery(&self) -> Result<Vec<GalleryImage>, ControllerError> {
        Ok(self.store.list_all().await?)
    }

    /// A single saved image.
    pub async fn gallery_image(&self, id: GalleryImageId) -> Result<GalleryImage, ControllerError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("gallery image {}", id)).into())
    }

    /// Delete a saved image. Deleting an absent id succeeds.
    pub async fn delete(&self, id: GalleryImageId) -> Result<(), ControllerError> {
        self.store.remove(id).await?;
        Ok(())
    }

    /// Make a saved image the current one, e.g. to edit it further.
    pub async fn load_from_gallery(
        &self,
        id: GalleryImageId,
    ) -> Result<EncodedImage, ControllerError> {
        let record = self.gallery_image(id).await?;
        let image = EncodedImage::parse(&record.image_data)?;

        let mut session = self.session.write();
        if session.busy {
            return Err(ControllerError::Busy);
        }
        session.current = Some(image.clone());
        session.updated_at = Some(Utc::now());
        Ok(image)
    }
}

fn require_text(value: &str, what: &str) -> Result<String, ControllerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ControllerError::invalid(format!("The {} cannot be empty.", what)));
    }
    Ok(value.to_string())
}
