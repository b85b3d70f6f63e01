use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use tracing::{debug, warn};

use super::surface::RasterSurface;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("malformed data URL: {0}")]
    DataUrl(String),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

pub trait SurfaceEncoder: Send + Sync {
    /// Primary path. `None` means the path is unavailable.
    fn to_blob(&self, surface: &RasterSurface) -> Option<Result<Vec<u8>, EncodeError>>;

    fn to_data_url(&self, surface: &RasterSurface) -> Result<String, EncodeError>;
}

#[derive(Debug, Clone, Copy)]
pub struct PngSurfaceEncoder {
    blob_api: bool,
}

impl PngSurfaceEncoder {
    pub fn new(blob_api: bool) -> Self {
        Self { blob_api }
    }
}

impl Default for PngSurfaceEncoder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SurfaceEncoder for PngSurfaceEncoder {
    fn to_blob(&self, surface: &RasterSurface) -> Option<Result<Vec<u8>, EncodeError>> {
        if !self.blob_api {
            return None;
        }

        let image = surface.image();
        let mut bytes = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, FilterType::Adaptive);
        let result = encoder
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )
            .map(|()| bytes)
            .map_err(EncodeError::from);
        Some(result)
    }

    fn to_data_url(&self, surface: &RasterSurface) -> Result<String, EncodeError> {
        let mut bytes = Vec::new();
        surface
            .image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(format!("{PNG_DATA_URL_PREFIX}{}", BASE64.encode(bytes)))
    }
}

pub fn decode_data_url(url: &str) -> Result<Vec<u8>, EncodeError> {
    let payload = url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or_else(|| EncodeError::DataUrl(url.chars().take(32).collect()))?;
    Ok(BASE64.decode(payload)?)
}

/// Blob path first, data URL path when the blob path is unavailable or fails.
/// `None` when both fail.
pub fn encode_png(encoder: &dyn SurfaceEncoder, surface: &RasterSurface) -> Option<Vec<u8>> {
    match encoder.to_blob(surface) {
        Some(Ok(bytes)) => return Some(bytes),
        Some(Err(err)) => warn!(error = %err, "blob encoding failed, trying data URL"),
        None => debug!("blob encoding unavailable, using data URL"),
    }

    match encoder
        .to_data_url(surface)
        .and_then(|url| decode_data_url(&url))
    {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            warn!(error = %err, "data URL encoding failed");
            None
        }
    }
}
