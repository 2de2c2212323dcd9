//! Imageforge-DB: Gallery storage, migrations, and query operations
//!
//! This crate persists gallery images in SQLite using rusqlite and r2d2
//! connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Synchronous query operations on a connection
//! - `store` - The async, lazily initialized [`GalleryStore`](store::GalleryStore)
//!
//! # Example
//!
//! ```no_run
//! use imageforge_db::store::GalleryStore;
//!
//! # async fn run() -> imageforge_common::Result<()> {
//! let store = GalleryStore::open("/var/lib/imageforge");
//! let id = store.add("data:image/png;base64,AAAA").await?;
//! let images = store.list_all().await?;
//! assert_eq!(images[0].id, id);
//! # Ok(())
//! # }
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;
