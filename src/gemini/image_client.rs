use crate::{
    config::GeminiConfig,
    error::{EditError, Result},
    gemini::ImageModel,
    models::gemini::{GenerateContentRequest, GenerateContentResponse, InlineData},
};
use async_trait::async_trait;
use reqwest::Client;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Fails when the credential is missing, so the proxy never starts without one.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EditError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: config.model().to_string(),
            base_url: config.base_url().to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ImageModel for GeminiClient {
    async fn edit_image(
        &self,
        image: InlineData,
        prompt: &str,
    ) -> Result<GenerateContentResponse> {
        let payload = GenerateContentRequest::image_edit(image, prompt);

        log::info!("Invoking image model: {}", self.model);
        log::debug!("Prompt: {}", prompt);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EditError::UpstreamFailure(format!("Model request timed out: {}", e))
                } else {
                    EditError::UpstreamFailure(format!("Model request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EditError::UpstreamFailure(format!(
                "Model returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| EditError::UpstreamFailure(format!("Malformed model response: {}", e)))?;

        if let Some(reason) = parsed.finish_reason() {
            log::debug!("Model finish reason: {}", reason);
        }

        Ok(parsed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
