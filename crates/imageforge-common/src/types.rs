//! Core type definitions for images and image operations.
//!
//! [`EncodedImage`] is the self-describing image representation passed
//! between the HTTP layer, the controller, the image service, and the
//! gallery store. On the wire and on disk it is a `data:` URL.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An encoded image: MIME type plus base64 payload.
///
/// Serialized as a `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncodedImage {
    mime_type: String,
    data: String,
}

impl EncodedImage {
    /// Encode raw bytes with the given MIME type.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Build from an already base64-encoded payload.
    ///
    /// The payload is validated so that [`decode`](Self::decode) cannot fail later.
    pub fn from_base64(mime_type: impl Into<String>, data: impl Into<String>) -> Result<Self> {
        let mime_type = mime_type.into();
        let data = data.into();
        validate_mime(&mime_type)?;
        validate_payload(&data)?;
        Ok(Self { mime_type, data })
    }

    /// Encode raw bytes, detecting the MIME type from the file signature.
    ///
    /// Returns `None` when the bytes do not start with a known image signature.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        sniff_mime(bytes).map(|mime| Self::from_bytes(mime, bytes))
    }

    /// Parse a `data:` URL.
    pub fn parse(data_url: &str) -> Result<Self> {
        let rest = data_url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| Error::invalid_input("image data must be a data: URL"))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::invalid_input("data URL is missing the ',' separator"))?;

        let header = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::invalid_input("data URL must be base64 encoded"))?;

        let mime_type = header.split(';').next().unwrap_or_default();

        Self::from_base64(mime_type, payload)
    }

    /// The MIME type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload without the data URL header.
    pub fn base64_data(&self) -> &str {
        &self.data
    }

    /// Render as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decode the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| Error::invalid_input(format!("invalid base64 payload: {}", e)))
    }

    /// Conventional file extension for the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}

impl FromStr for EncodedImage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EncodedImage {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<EncodedImage> for String {
    fn from(image: EncodedImage) -> Self {
        image.to_data_url()
    }
}

fn validate_mime(mime_type: &str) -> Result<()> {
    match mime_type.strip_prefix("image/") {
        Some(subtype) if !subtype.is_empty() => Ok(()),
        _ => Err(Error::invalid_input(format!(
            "unsupported MIME type '{}'",
            mime_type
        ))),
    }
}

fn validate_payload(data: &str) -> Result<()> {
    if data.is_empty() {
        return Err(Error::invalid_input("image payload is empty"));
    }
    STANDARD
        .decode(data)
        .map(|_| ())
        .map_err(|e| Error::invalid_input(format!("invalid base64 payload: {}", e)))
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Output aspect ratio requested from the image service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    /// 1:1 square.
    #[default]
    Square,
    /// 16:9 landscape.
    Landscape,
    /// 9:16 portrait.
    Portrait,
    /// 4:3 landscape.
    Standard,
    /// 3:4 portrait.
    StandardPortrait,
    /// 3:2 landscape.
    Photo,
    /// 2:3 portrait.
    PhotoPortrait,
    /// 21:9 ultrawide.
    Ultrawide,
}

impl AspectRatio {
    /// All supported ratios.
    pub const ALL: [AspectRatio; 8] = [
        Self::Square,
        Self::Landscape,
        Self::Portrait,
        Self::Standard,
        Self::StandardPortrait,
        Self::Photo,
        Self::PhotoPortrait,
        Self::Ultrawide,
    ];

    /// The `W:H` form sent to the image service.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
            Self::Photo => "3:2",
            Self::PhotoPortrait => "2:3",
            Self::Ultrawide => "21:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s)
            .ok_or_else(|| Error::invalid_input(format!("unsupported aspect ratio '{}'", s)))
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(ratio: AspectRatio) -> Self {
        ratio.as_str().to_string()
    }
}

/// Kind of image operation performed through the image service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOperation {
    /// Text-to-image generation.
    Generate,
    /// Edit a single input image.
    Edit,
    /// Merge two or more input images.
    Merge,
    /// Compose a titled thumbnail from one or more input images.
    Thumbnail,
}

impl fmt::Display for ImageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate => write!(f, "generate"),
            Self::Edit => write!(f, "edit"),
            Self::Merge => write!(f, "merge"),
            Self::Thumbnail => write!(f, "thumbnail"),
        }
    }
}
