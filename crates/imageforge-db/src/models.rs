//! Rust models matching the database schema.

use chrono::{DateTime, Utc};
use imageforge_common::GalleryImageId;
use serde::{Deserialize, Serialize};

/// A saved gallery image.
///
/// Records are never updated in place; the only lifecycle events are
/// insertion and deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GalleryImage {
    pub id: GalleryImageId,
    /// Encoded-image string (a `data:` URL), stored exactly as given.
    pub image_data: String,
    pub created_at: DateTime<Utc>,
}

impl GalleryImage {
    /// Build from a row with columns `id, image_data, created_at`.
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let created_at: String = row.get(2)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
            })?
            .with_timezone(&Utc);

        Ok(Self {
            id: GalleryImageId::from(row.get::<_, i64>(0)?),
            image_data: row.get(1)?,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gallery_image_json_shape() {
        let image = GalleryImage {
            id: GalleryImageId::from(2),
            image_data: "data:image/png;base64,BBB".to_string(),
            created_at: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["image_data"], "data:image/png;base64,BBB");
        assert!(json["created_at"].as_str().unwrap().starts_with("2024-05-01"));
    }
}
