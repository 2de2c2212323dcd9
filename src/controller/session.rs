//! Session state for the current image and the one-operation-at-a-time guard.

use chrono::{DateTime, Utc};
use imageforge_common::{AspectRatio, EncodedImage, ImageOperation};
use parking_lot::RwLock;
use serde::Serialize;

use super::ControllerError;

/// Transient per-process UI state. Never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    /// Prompt of the last successful operation.
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    /// Result of the last successful operation, or an image loaded from the gallery.
    pub current: Option<EncodedImage>,
    pub last_operation: Option<ImageOperation>,
    /// An image operation is in flight.
    pub busy: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Marks the session busy for as long as it is alive.
pub(super) struct BusyGuard<'a> {
    session: &'a RwLock<SessionState>,
}

impl<'a> BusyGuard<'a> {
    pub(super) fn acquire(session: &'a RwLock<SessionState>) -> Result<Self, ControllerError> {
        let mut state = session.write();
        if state.busy {
            return Err(ControllerError::Busy);
        }
        state.busy = true;
        Ok(Self { session })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.session.write().busy = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_guard_is_exclusive() {
        let session = RwLock::new(SessionState::default());

        let guard = BusyGuard::acquire(&session).unwrap();
        assert!(session.read().busy);
        assert!(matches!(
            BusyGuard::acquire(&session),
            Err(ControllerError::Busy)
        ));

        drop(guard);
        assert!(!session.read().busy);
        assert!(BusyGuard::acquire(&session).is_ok());
    }

    #[test]
    fn test_session_serializes_current_as_data_url() {
        let state = SessionState {
            current: Some(EncodedImage::parse("data:image/png;base64,AAAA").unwrap()),
            last_operation: Some(ImageOperation::Generate),
            ..Default::default()
        };

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["current"], "data:image/png;base64,AAAA");
        assert_eq!(json["aspect_ratio"], "1:1");
        assert_eq!(json["last_operation"], "generate");
        assert_eq!(json["busy"], false);
    }
}
