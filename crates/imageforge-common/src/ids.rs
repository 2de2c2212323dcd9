//! Typed ID wrappers.
//!
//! Gallery record ids are integers assigned by the store at insertion time.
//! Wrapping them keeps raw row counts and other integers from being passed
//! where a record id is expected.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Store-assigned identifier of a gallery record.
///
/// Ids are never supplied by callers when creating a record; they are only
/// obtained from the store or parsed from external input referring to an
/// existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GalleryImageId(i64);

impl GalleryImageId {
    /// The raw integer value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for GalleryImageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<GalleryImageId> for i64 {
    fn from(id: GalleryImageId) -> Self {
        id.0
    }
}

impl FromStr for GalleryImageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl std::fmt::Display for GalleryImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
