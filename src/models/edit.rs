use crate::{
    encoder::{self, EncodedImage},
    error::{EditError, Result},
    models::media::MediaType,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Body the client posts to the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub base64_image_data: String,
    pub mime_type: String,
    pub prompt: String,
}

impl EditRequest {
    pub fn new(image: EncodedImage, prompt: impl Into<String>) -> Self {
        Self {
            base64_image_data: image.data,
            mime_type: image.media_type.as_mime().to_string(),
            prompt: prompt.into(),
        }
    }

    /// Image data and prompt must be non-empty and the media type accepted.
    pub fn validate(&self) -> Result<()> {
        if self.base64_image_data.is_empty() {
            return Err(EditError::ValidationError("Image data is empty.".into()));
        }
        if MediaType::from_mime(&self.mime_type).is_none() {
            return Err(EditError::ValidationError(format!(
                "Unsupported image type: {}",
                self.mime_type
            )));
        }
        if self.prompt.trim().is_empty() {
            return Err(EditError::ValidationError("Instruction is empty.".into()));
        }
        Ok(())
    }
}

/// Successful proxy reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponseBody {
    pub base64_image: String,
}

/// Error reply, for every non-2xx status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An edited image ready for display or download.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedImage {
    pub data: String,
    pub media_type: MediaType,
}

impl EditedImage {
    pub fn new(data: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            data: data.into(),
            media_type,
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type.as_mime(), self.data)
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        encoder::decode(&self.data)
    }

    pub fn default_file_name(&self) -> String {
        format!("edited-image.{}", self.media_type.extension())
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.bytes()?;
        tokio::fs::write(path, &bytes).await.map_err(|e| {
            EditError::EncodingError(format!("Failed to write {}: {}", path.display(), e))
        })?;
        log::info!("💾 Saved edited image to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Outcome of one submission. Exactly one side is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum EditResult {
    Image(EditedImage),
    Error(String),
}

impl EditResult {
    pub fn image(&self) -> Option<&EditedImage> {
        match self {
            EditResult::Image(image) => Some(image),
            EditResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            EditResult::Image(_) => None,
            EditResult::Error(message) => Some(message),
        }
    }
}
