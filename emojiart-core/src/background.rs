//! Document backgrounds.

use serde::{Deserialize, Serialize};
use url::Url;

/// The canvas backdrop. Replaced wholesale, never mutated in place.
///
/// Serialized externally tagged: `"blank"`, `{"url": "https://..."}` or
/// `{"image_data": "<base64>"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    /// No background image.
    #[default]
    Blank,
    /// An image referenced by address, fetched on demand.
    Url(Url),
    /// An image embedded in the document as encoded bytes.
    ImageData(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl Background {
    /// The address, if this is a URL background.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            _ => None,
        }
    }

    /// The embedded bytes, if this is an image-data background.
    #[must_use]
    pub fn image_data(&self) -> Option<&[u8]> {
        match self {
            Self::ImageData(data) => Some(data),
            _ => None,
        }
    }

    /// Whether this is the blank background.
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Short human readable description for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Blank => "blank".to_string(),
            Self::Url(url) => format!("url {url}"),
            Self::ImageData(data) => format!("{} bytes of image data", data.len()),
        }
    }
}

impl From<Url> for Background {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<Vec<u8>> for Background {
    fn from(data: Vec<u8>) -> Self {
        Self::ImageData(data)
    }
}

/// Base64 (standard alphabet, padded) encoding for embedded image bytes.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
