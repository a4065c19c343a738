//! Server side of the edit contract. Holds the model credential (inside the
//! model client) and is the only component that calls the model.

pub mod server;

use crate::{
    error::EditError,
    gemini::ImageModel,
    logger,
    models::{
        edit::{EditResponseBody, ErrorBody},
        gemini::InlineData,
    },
};
use actix_web::{http::Method, http::StatusCode, HttpResponse, ResponseError};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const MISSING_PARAMETERS: &str = "Missing required parameters.";
pub const NO_IMAGE: &str = "The AI model did not return an image.";
pub const UPSTREAM_FAILURE: &str = "Failed to generate image from AI model.";

/// Failures the proxy reports to its caller. `Display` is the exact body text.
#[derive(Debug, thiserror::Error)]
pub enum ProxyFailure {
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Missing required parameters.")]
    MissingParameters,
    #[error("The AI model did not return an image.")]
    NoImage,
    /// The source error is logged, never serialized.
    #[error("Failed to generate image from AI model.")]
    Upstream(#[source] EditError),
}

impl ResponseError for ProxyFailure {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyFailure::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyFailure::MissingParameters => StatusCode::BAD_REQUEST,
            ProxyFailure::NoImage | ProxyFailure::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

struct EditParams<'a> {
    image_data: &'a str,
    mime_type: &'a str,
    prompt: &'a str,
}

fn required<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)?.as_str().filter(|value| !value.is_empty())
}

impl<'a> EditParams<'a> {
    fn from_json(body: &'a Value) -> Option<Self> {
        Some(Self {
            image_data: required(body, "base64ImageData")?,
            mime_type: required(body, "mimeType")?,
            prompt: required(body, "prompt")?,
        })
    }
}

#[derive(Clone)]
pub struct EditProxy {
    model: Arc<dyn ImageModel>,
}

impl EditProxy {
    pub fn new(model: Arc<dyn ImageModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Handles one invocation. Stateless: nothing survives between calls.
    pub async fn handle(
        &self,
        method: &Method,
        body: &[u8],
    ) -> Result<EditResponseBody, ProxyFailure> {
        let request_id = Uuid::new_v4().simple().to_string();
        let request_id = &request_id[..8];

        if *method != Method::POST {
            log::warn!("[req:{}] Rejected {} request", request_id, method);
            return Err(ProxyFailure::MethodNotAllowed);
        }

        let json: Value = serde_json::from_slice(body).map_err(|e| {
            log::error!("[req:{}] Unparseable request body: {}", request_id, e);
            ProxyFailure::Upstream(e.into())
        })?;

        // `null` has no fields to read, unlike other non-object values
        if json.is_null() {
            log::error!("[req:{}] Request body is null", request_id);
            return Err(ProxyFailure::Upstream(EditError::ValidationError(
                "request body is null".into(),
            )));
        }

        let params = EditParams::from_json(&json).ok_or_else(|| {
            log::warn!("[req:{}] Request is missing required parameters", request_id);
            ProxyFailure::MissingParameters
        })?;

        log::info!(
            "[req:{}] Editing {} image ({} base64 chars) with {}",
            request_id,
            params.mime_type,
            params.image_data.len(),
            self.model.model_name()
        );

        let response = {
            let _timer = logger::timer(&format!("[req:{}] model call", request_id));
            self.model
                .edit_image(
                    InlineData {
                        mime_type: params.mime_type.to_string(),
                        data: params.image_data.to_string(),
                    },
                    params.prompt,
                )
                .await
        }
        .map_err(|e| {
            log::error!("[req:{}] Model call failed: {}", request_id, e);
            ProxyFailure::Upstream(e)
        })?;

        match response.first_inline_image() {
            Some(image) if !image.data.is_empty() => {
                log::info!(
                    "[req:{}] Model returned {} image ({} base64 chars)",
                    request_id,
                    image.mime_type,
                    image.data.len()
                );
                Ok(EditResponseBody {
                    base64_image: image.data.clone(),
                })
            }
            _ => {
                log::warn!(
                    "[req:{}] Model reply had {} part(s) and no image (finish reason: {})",
                    request_id,
                    response.parts().len(),
                    response.finish_reason().unwrap_or("none")
                );
                Err(ProxyFailure::NoImage)
            }
        }
    }
}
