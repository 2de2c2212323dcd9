//! Database query modules.
//!
//! - gallery: insert, list (newest-first), get, count, and delete of saved images

pub mod gallery;
