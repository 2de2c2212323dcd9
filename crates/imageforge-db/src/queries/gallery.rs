//! Gallery image queries.
//!
//! Insert, list, get, find, count, and delete for saved images. Writes report
//! [`Error::Write`] and reads report [`Error::Read`]; a missing row is
//! never an error.

use chrono::Utc;
use imageforge_common::{Error, GalleryImageId, Result};
use rusqlite::Connection;

use crate::models::GalleryImage;

/// Insert a new gallery image.
///
/// The id is assigned by SQLite and returned to the caller.
///
/// # Returns
///
/// * `Ok(GalleryImageId)` - The id of the inserted record
/// * `Err(Error::Write)` - If the insert fails to commit
pub fn insert_image(conn: &Connection, image_data: &str) -> Result<GalleryImageId> {
    conn.execute(
        "INSERT INTO images (image_data, created_at) VALUES (:image_data, :created_at)",
        rusqlite::named_params! {
            ":image_data": image_data,
            ":created_at": Utc::now().to_rfc3339(),
        },
    )
    .map_err(|e| Error::write(e.to_string()))?;

    Ok(GalleryImageId::from(conn.last_insert_rowid()))
}

/// List every gallery image, newest first.
///
/// Ids grow with insertion order, so descending id order is reverse
/// insertion order.
///
/// # Returns
///
/// * `Ok(Vec<GalleryImage>)` - All records, most recently saved first
/// * `Err(Error::Read)` - If the query fails; no partial list is returned
pub fn list_images(conn: &Connection) -> Result<Vec<GalleryImage>> {
    let mut stmt = conn
        .prepare("SELECT id, image_data, created_at FROM images ORDER BY id DESC")
        .map_err(|e| Error::read(e.to_string()))?;

    let images = stmt
        .query_map([], GalleryImage::from_row)
        .map_err(|e| Error::read(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::read(e.to_string()))?;

    Ok(images)
}

/// Get a gallery image by id.
///
/// # Returns
///
/// * `Ok(Some(GalleryImage))` - The image if found
/// * `Ok(None)` - If no record has this id
/// * `Err(Error::Read)` - If the query fails
pub fn get_image(conn: &Connection, id: GalleryImageId) -> Result<Option<GalleryImage>> {
    let result = conn.query_row(
        "SELECT id, image_data, created_at FROM images WHERE id = :id",
        rusqlite::named_params! { ":id": id.get() },
        GalleryImage::from_row,
    );

    match result {
        Ok(image) => Ok(Some(image)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::read(e.to_string())),
    }
}

/// Find the id of an image with exactly this data.
///
/// # Returns
///
/// * `Ok(Some(GalleryImageId))` - The oldest record holding `image_data`
/// * `Ok(None)` - If no record matches
/// * `Err(Error::Read)` - If the query fails
pub fn find_by_image_data(conn: &Connection, image_data: &str) -> Result<Option<GalleryImageId>> {
    let result = conn.query_row(
        "SELECT id FROM images WHERE image_data = :image_data ORDER BY id LIMIT 1",
        rusqlite::named_params! { ":image_data": image_data },
        |row| row.get::<_, i64>(0),
    );

    match result {
        Ok(id) => Ok(Some(GalleryImageId::from(id))),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::read(e.to_string())),
    }
}

/// Count the gallery images.
pub fn count_images(conn: &Connection) -> Result<u64> {
    conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get::<_, i64>(0))
        .map(|count| count as u64)
        .map_err(|e| Error::read(e.to_string()))
}

/// Delete a gallery image by id.
///
/// # Returns
///
/// * `Ok(true)` - If the image was deleted
/// * `Ok(false)` - If no record had this id
/// * `Err(Error::Write)` - If the delete fails to commit
pub fn delete_image(conn: &Connection, id: GalleryImageId) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "DELETE FROM images WHERE id = :id",
            rusqlite::named_params! { ":id": id.get() },
        )
        .map_err(|e| Error::write(e.to_string()))?;

    Ok(rows_affected > 0)
}
