use crate::{
    client::EditService,
    config::ClientConfig,
    error::{EditError, Result, GENERIC_FAILURE_MESSAGE},
    models::edit::{EditRequest, ErrorBody},
    proxy::NO_IMAGE,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuccessBody {
    #[serde(default)]
    base64_image: Option<String>,
}

#[derive(Clone)]
pub struct EditClient {
    client: Client,
    endpoint: String,
}

impl EditClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EditError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Maps a non-2xx reply. The proxy's own no-image message keeps its kind.
fn rejection(status: u16, body: &str) -> EditError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error }) if error == NO_IMAGE => EditError::ModelEmptyResult(error),
        Ok(ErrorBody { error }) if !error.is_empty() => EditError::ProxyRejection {
            status,
            message: error,
        },
        _ => EditError::ProxyRejection {
            status,
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        },
    }
}

#[async_trait]
impl EditService for EditClient {
    async fn edit(&self, request: &EditRequest) -> Result<Option<String>> {
        request.validate()?;
        log::info!("Sending edit request to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                log::error!("Error calling the edit image function: {}", e);
                if e.is_timeout() {
                    EditError::TransportError("the request timed out".into())
                } else {
                    EditError::TransportError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EditError::TransportError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let err = rejection(status.as_u16(), &body);
            log::warn!("Edit request failed: {}", err);
            return Err(err);
        }

        let parsed: SuccessBody = serde_json::from_str(&body)?;
        Ok(parsed.base64_image.filter(|data| !data.is_empty()))
    }
}
