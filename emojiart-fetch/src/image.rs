//! Image decoding utilities.
//!
//! Turns fetched bytes (or an inline `data:` URI) into RGBA pixels for the
//! background resolver.

use emojiart_core::{DecodedImage, ImageDecoder, ResolveError};

use crate::error::{FetchError, FetchResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF (first frame only).
    Gif,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }
}

/// Decodes raster images with the `image` crate.
///
/// Large images can be bounded with [`RasterDecoder::with_max_dimension`];
/// anything bigger is downscaled preserving aspect ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder {
    max_dimension: Option<u32>,
}

impl RasterDecoder {
    /// Create a decoder that keeps images at their native size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder that downscales anything wider or taller than `max`.
    #[must_use]
    pub fn with_max_dimension(max: u32) -> Self {
        Self {
            max_dimension: Some(max.max(1)),
        }
    }

    /// The configured size bound, if any.
    #[must_use]
    pub fn max_dimension(&self) -> Option<u32> {
        self.max_dimension
    }

    /// Decode `data` into RGBA pixels.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] if the bytes are not a supported image.
    pub fn decode_bytes(&self, data: &[u8]) -> FetchResult<DecodedImage> {
        let format = ImageFormat::from_magic_bytes(data);

        let img = image::load_from_memory(data).map_err(|e| FetchError::Decode(e.to_string()))?;
        let mut rgba = img.to_rgba8();

        if let Some(max) = self.max_dimension {
            if let Some(resized) = resize_to_fit(&rgba, max, max) {
                tracing::debug!(
                    from = ?rgba.dimensions(),
                    to = ?resized.dimensions(),
                    "Downscaled background image"
                );
                rgba = resized;
            }
        }

        let (width, height) = rgba.dimensions();
        tracing::debug!(?format, width, height, "Decoded image");
        Ok(DecodedImage::new(width, height, rgba.into_raw()))
    }
}

impl ImageDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ResolveError> {
        self.decode_bytes(bytes)
            .map_err(|e| ResolveError::Decode(e.to_string()))
    }
}

/// Extract the payload of a `data:` URI.
///
/// Supports both `data:image/png;base64,iVBORw0KGgo...` and percent-encoded
/// payloads.
///
/// # Errors
///
/// Returns [`FetchError::InvalidDataUri`] if the URI is malformed.
pub fn decode_data_uri(uri: &str) -> FetchResult<Vec<u8>> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::InvalidDataUri("not a data URI".to_string()))?;

    let (metadata, encoded) = uri_data
        .split_once(',')
        .ok_or_else(|| FetchError::InvalidDataUri("missing comma".to_string()))?;

    if metadata.split(';').any(|part| part == "base64") {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| FetchError::InvalidDataUri(format!("bad base64: {e}")))
    } else {
        Ok(percent_encoding::percent_decode_str(encoded).collect())
    }
}

/// The declared MIME type of a `data:` URI, if any.
#[must_use]
pub fn data_uri_mime(uri: &str) -> Option<&str> {
    let metadata = uri.strip_prefix("data:")?.split_once(',')?.0;
    let mime = metadata.split(';').next()?;
    (!mime.is_empty()).then_some(mime)
}

/// Resize an image to fit within max dimensions while preserving aspect ratio.
///
/// Returns `None` if the image is already within bounds.
#[must_use]
pub fn resize_to_fit(
    img: &image::RgbaImage,
    max_width: u32,
    max_height: u32,
) -> Option<image::RgbaImage> {
    let (width, height) = img.dimensions();
    if width <= max_width && height <= max_height {
        return None;
    }

    let scale_x = f64::from(max_width) / f64::from(width);
    let scale_y = f64::from(max_height) / f64::from(height);
    let scale = scale_x.min(scale_y);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_width = ((f64::from(width) * scale) as u32).max(1);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_height = ((f64::from(height) * scale) as u32).max(1);

    Some(image::imageops::resize(
        img,
        new_width,
        new_height,
        image::imageops::FilterType::Lanczos3,
    ))
}
