//! The gallery store service object.
//!
//! [`GalleryStore`] owns one lazily opened handle (a [`DbPool`]) to the
//! gallery database. The handle is opened on first use by any operation,
//! cached, and reused until the store is dropped. Construct one store per
//! process (shared behind an `Arc`), or a fresh in-memory store per test.
//!
//! Each operation runs its SQLite work on tokio's blocking pool and resolves
//! exactly once, with either the result or one of the storage error kinds.

use std::path::{Path, PathBuf};

use imageforge_common::{Error, GalleryImageId, Result};
use rusqlite::Connection;
use tokio::sync::OnceCell;

use crate::models::GalleryImage;
use crate::pool::{get_conn, init_memory_pool, init_pool, DbPool};
use crate::queries::gallery;

/// File name of the gallery database inside the data directory.
pub const DATABASE_FILE: &str = "imageforge-gallery.sqlite";

#[derive(Debug, Clone)]
enum Location {
    Directory(PathBuf),
    Memory,
}

/// Durable storage for gallery images.
pub struct GalleryStore {
    location: Location,
    handle: OnceCell<DbPool>,
}

impl GalleryStore {
    /// A store backed by [`DATABASE_FILE`] inside `data_dir`.
    ///
    /// Nothing is touched on disk until the first operation.
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::Directory(data_dir.into()),
            handle: OnceCell::new(),
        }
    }

    /// A store backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            handle: OnceCell::new(),
        }
    }

    /// Path of the database file, if file-backed.
    pub fn database_path(&self) -> Option<PathBuf> {
        match &self.location {
            Location::Directory(dir) => Some(dir.join(DATABASE_FILE)),
            Location::Memory => None,
        }
    }

    /// Whether the handle has been opened.
    pub fn is_initialized(&self) -> bool {
        self.handle.initialized()
    }

    /// Open the database, creating the file and collection if absent.
    ///
    /// Idempotent: concurrent callers wait on the same open, and once it
    /// succeeds the cached handle is returned without reopening. A failed
    /// open is returned to the caller and not cached, so a later call tries
    /// again.
    pub async fn initialize(&self) -> Result<&DbPool> {
        self.handle
            .get_or_try_init(|| async {
                let location = self.location.clone();
                tokio::task::spawn_blocking(move || open_location(&location))
                    .await
                    .map_err(|e| Error::initialization(format!("open task failed: {}", e)))?
            })
            .await
    }

    /// Save a new image and return its store-assigned id.
    pub async fn add(&self, image_data: impl Into<String>) -> Result<GalleryImageId> {
        let image_data = image_data.into();
        let id = self
            .run(Error::write, move |conn| {
                gallery::insert_image(conn, &image_data)
            })
            .await?;
        tracing::debug!(%id, "Saved gallery image");
        Ok(id)
    }

    /// Every saved image, most recently saved first.
    pub async fn list_all(&self) -> Result<Vec<GalleryImage>> {
        self.run(Error::read, gallery::list_images).await
    }

    /// A single saved image.
    pub async fn get(&self, id: GalleryImageId) -> Result<Option<GalleryImage>> {
        self.run(Error::read, move |conn| gallery::get_image(conn, id))
            .await
    }

    /// Id of a saved image with exactly this data, if any.
    pub async fn find(&self, image_data: impl Into<String>) -> Result<Option<GalleryImageId>> {
        let image_data = image_data.into();
        self.run(Error::read, move |conn| {
            gallery::find_by_image_data(conn, &image_data)
        })
        .await
    }

    /// Number of saved images.
    pub async fn count(&self) -> Result<u64> {
        self.run(Error::read, gallery::count_images).await
    }

    /// Delete an image. Removing an id that does not exist succeeds.
    pub async fn remove(&self, id: GalleryImageId) -> Result<()> {
        let deleted = self
            .run(Error::write, move |conn| gallery::delete_image(conn, id))
            .await?;
        if deleted {
            tracing::debug!(%id, "Removed gallery image");
        } else {
            tracing::debug!(%id, "Gallery image already absent");
        }
        Ok(())
    }

    async fn run<T, F>(&self, kind: fn(String) -> Error, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.initialize().await?.clone();
        tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool, kind)?;
            op(&conn)
        })
        .await
        .map_err(|e| kind(format!("storage task failed: {}", e)))?
    }
}

impl std::fmt::Debug for GalleryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryStore")
            .field("location", &self.location)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

fn open_location(location: &Location) -> Result<DbPool> {
    match location {
        Location::Memory => init_memory_pool(),
        Location::Directory(dir) => open_directory(dir),
    }
}

fn open_directory(dir: &Path) -> Result<DbPool> {
    std::fs::create_dir_all(dir).map_err(|e| {
        Error::initialization(format!("Failed to create data directory {:?}: {}", dir, e))
    })?;

    let path = dir.join(DATABASE_FILE);
    tracing::info!("Opening gallery database at {:?}", path);
    init_pool(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Name of the table holding gallery records.
    const COLLECTION_NAME: &str = "images";

    const AAA: &str = "data:image/png;base64,AAA";
    const BBB: &str = "data:image/png;base64,BBB";
    const CCC: &str = "data:image/png;base64,CCC";

    #[tokio::test]
    async fn test_operations_initialize_lazily() {
        let store = GalleryStore::in_memory();
        assert!(!store.is_initialized());

        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.is_initialized());
    }

    #[tokio::test]
    async fn test_initialize_returns_cached_handle() {
        let store = GalleryStore::in_memory();

        let (a, b) = tokio::join!(store.initialize(), store.initialize());
        let a = a.unwrap();
        let b = b.unwrap();
        assert!(std::ptr::eq(a, b));

        let c = store.initialize().await.unwrap();
        assert!(std::ptr::eq(a, c));
    }

    #[tokio::test]
    async fn test_scenario_add_list_remove() {
        let store = GalleryStore::in_memory();
        assert!(store.list_all().await.unwrap().is_empty());

        let first = store.add(AAA).await.unwrap();
        assert_eq!(first.get(), 1);
        let second = store.add(BBB).await.unwrap();
        assert_eq!(second.get(), 2);

        let listed: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|img| (img.id.get(), img.image_data))
            .collect();
        assert_eq!(
            listed,
            vec![(2, BBB.to_string()), (1, AAA.to_string())]
        );

        store.remove(first).await.unwrap();
        let after: Vec<_> = store.list_all().await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, second);

        store.remove(first).await.unwrap();
        assert_eq!(store.list_all().await.unwrap(), after);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = GalleryStore::in_memory();
        let mut seen = HashSet::new();

        for i in 0..20 {
            let id = store.add(format!("data:image/png;base64,{:04}", i)).await.unwrap();
            assert!(seen.insert(id), "id {} returned twice", id);
            if i % 3 == 0 {
                store.remove(id).await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_removed_highest_id_not_recycled() {
        let store = GalleryStore::in_memory();
        store.add(AAA).await.unwrap();
        let second = store.add(BBB).await.unwrap();
        store.remove(second).await.unwrap();

        let third = store.add(CCC).await.unwrap();
        assert!(third > second);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = GalleryStore::in_memory();
        store.add(AAA).await.unwrap();
        store.add(BBB).await.unwrap();
        store.add(CCC).await.unwrap();

        let data: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|img| img.image_data)
            .collect();
        assert_eq!(data, vec![CCC, BBB, AAA]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent_and_targeted() {
        let store = GalleryStore::in_memory();
        let keep = store.add(AAA).await.unwrap();
        let discard = store.add(BBB).await.unwrap();

        store.remove(discard).await.unwrap();
        store.remove(discard).await.unwrap();
        store.remove(GalleryImageId::from(1000)).await.unwrap();

        let remaining = store.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep);
        assert_eq!(remaining[0].image_data, AAA);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_data() {
        let store = GalleryStore::in_memory();
        let data = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==";

        let id = store.add(data).await.unwrap();
        let matching: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|img| img.id == id)
            .collect();

        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].image_data, data);
        assert_eq!(store.get(id).await.unwrap().unwrap().image_data, data);
    }

    #[tokio::test]
    async fn test_removed_id_absent_from_list() {
        let store = GalleryStore::in_memory();
        let a = store.add(AAA).await.unwrap();
        store.add(BBB).await.unwrap();

        store.remove(a).await.unwrap();

        assert!(store.list_all().await.unwrap().iter().all(|img| img.id != a));
        assert!(store.get(a).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let id = {
            let store = GalleryStore::open(dir.path());
            store.add(AAA).await.unwrap()
        };

        let reopened = GalleryStore::open(dir.path());
        let images = reopened.list_all().await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, id);
        assert_eq!(
            reopened.database_path().unwrap(),
            dir.path().join(DATABASE_FILE)
        );

        let conn = Connection::open(dir.path().join(DATABASE_FILE)).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [COLLECTION_NAME],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(GalleryStore::open(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.add(format!("data:image/png;base64,{:04}", i)).await
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap());
        }
        assert_eq!(ids.len(), 8);
        assert_eq!(store.count().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_unusable_directory_is_initialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("file");
        std::fs::write(&not_a_dir, b"x").unwrap();

        let store = GalleryStore::open(&not_a_dir);
        let err = store.add(AAA).await.unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));
        assert!(!store.is_initialized());
    }

    #[tokio::test]
    async fn test_newer_schema_is_initialization_error() {
        let dir = tempfile::tempdir().unwrap();
        GalleryStore::open(dir.path()).initialize().await.unwrap();

        let conn = Connection::open(dir.path().join(DATABASE_FILE)).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (99, 'future')",
            [],
        )
        .unwrap();
        drop(conn);

        let err = GalleryStore::open(dir.path()).list_all().await.unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));
    }

    #[tokio::test]
    async fn test_find_matches_exact_data() {
        let store = GalleryStore::in_memory();
        assert!(store.find(AAA).await.unwrap().is_none());

        let id = store.add(AAA).await.unwrap();
        store.add(BBB).await.unwrap();

        assert_eq!(store.find(AAA).await.unwrap(), Some(id));
        assert!(store.find(CCC).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejected_writes_are_write_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::open(dir.path());
        let id = store.add(AAA).await.unwrap();

        let conn = Connection::open(dir.path().join(DATABASE_FILE)).unwrap();
        conn.execute_batch(&format!(
            "CREATE TRIGGER no_insert BEFORE INSERT ON {table}
                 BEGIN SELECT RAISE(ABORT, 'gallery is read-only'); END;
             CREATE TRIGGER no_delete BEFORE DELETE ON {table}
                 BEGIN SELECT RAISE(ABORT, 'gallery is read-only'); END;",
            table = COLLECTION_NAME
        ))
        .unwrap();
        drop(conn);

        let err = store.add(BBB).await.unwrap_err();
        assert!(matches!(err, Error::Write(ref m) if m.contains("read-only")));

        let err = store.remove(id).await.unwrap_err();
        assert!(matches!(err, Error::Write(_)));

        // Nothing changed and reads still work.
        let images = store.list_all().await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, id);
    }

    #[tokio::test]
    async fn test_failed_reads_are_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::open(dir.path());
        store.add(AAA).await.unwrap();

        let conn = Connection::open(dir.path().join(DATABASE_FILE)).unwrap();
        conn.execute_batch(&format!(
            "ALTER TABLE {} RENAME TO images_moved",
            COLLECTION_NAME
        ))
        .unwrap();
        drop(conn);

        assert!(matches!(store.list_all().await.unwrap_err(), Error::Read(_)));
        assert!(matches!(store.count().await.unwrap_err(), Error::Read(_)));
        assert!(matches!(store.find(AAA).await.unwrap_err(), Error::Read(_)));
    }
}
