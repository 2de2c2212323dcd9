//! Imageforge-Common: Shared types, IDs, and error handling.
//!
//! This crate provides common functionality used across imageforge:
//!
//! - **Typed IDs**: A newtype wrapper for store-assigned gallery record ids
//! - **Core Types**: Encoded images (data URLs), aspect ratios, and image operations
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use imageforge_common::{AspectRatio, EncodedImage, Error, GalleryImageId, Result};
//!
//! let image = EncodedImage::from_bytes("image/png", b"\x89PNG\r\n\x1a\n");
//! assert!(image.to_data_url().starts_with("data:image/png;base64,"));
//!
//! let ratio: AspectRatio = "16:9".parse().unwrap();
//! assert_eq!(ratio.to_string(), "16:9");
//!
//! let id = GalleryImageId::from(7);
//! assert_eq!(id.get(), 7);
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("gallery image 7"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
