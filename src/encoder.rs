//! Base64 transfer encoding for uploaded images.

use crate::{
    error::{EditError, Result},
    models::media::{MediaType, MAX_UPLOAD_BYTES},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::io::Read;
use std::path::Path;

/// Image bytes in transfer encoding, with their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: String,
    pub media_type: MediaType,
}

impl EncodedImage {
    pub fn new(data: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            data: data.into(),
            media_type,
        }
    }

    pub fn from_bytes(bytes: &[u8], media_type: MediaType) -> Self {
        if bytes.len() > MAX_UPLOAD_BYTES {
            log::warn!(
                "Image is {} bytes, above the {} byte upload guidance",
                bytes.len(),
                MAX_UPLOAD_BYTES
            );
        }
        Self::new(encode(bytes), media_type)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type.as_mime(), self.data)
    }
}

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| EditError::EncodingError(format!("Invalid base64 image data: {}", e)))
}

pub fn encode_reader<R: Read>(mut reader: R, media_type: MediaType) -> Result<EncodedImage> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| EditError::EncodingError(format!("Failed to read image: {}", e)))?;
    Ok(EncodedImage::from_bytes(&bytes, media_type))
}

/// Detects the media type from the bytes, falling back to the file extension.
pub fn detect_media_type(bytes: &[u8], path: Option<&Path>) -> Result<MediaType> {
    MediaType::from_magic_bytes(bytes)
        .or_else(|| path.and_then(MediaType::from_extension))
        .ok_or_else(|| {
            EditError::EncodingError("Unsupported image type; use PNG, JPEG or WEBP".into())
        })
}

pub async fn read_image(path: impl AsRef<Path>) -> Result<EncodedImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        EditError::EncodingError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let media_type = detect_media_type(&bytes, Some(path))?;
    log::debug!(
        "Encoding {} ({}, {} bytes)",
        path.display(),
        media_type,
        bytes.len()
    );
    Ok(EncodedImage::from_bytes(&bytes, media_type))
}
