pub mod image_client;

use crate::{
    error::Result,
    models::gemini::{GenerateContentResponse, InlineData},
};
use async_trait::async_trait;

pub use image_client::GeminiClient;

/// The external generative model. Only the proxy talks to it.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Sends the source image and instruction, asking for an image-only reply.
    async fn edit_image(&self, image: InlineData, prompt: &str)
        -> Result<GenerateContentResponse>;

    fn model_name(&self) -> &str;
}
