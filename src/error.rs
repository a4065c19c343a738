use std::fmt;

/// Message shown when the proxy answered with an error body we could not read.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate image.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Encoding,
    Transport,
    ProxyRejection,
    ModelEmptyResult,
    Upstream,
    Config,
    Serialization,
    Cancelled,
}

#[derive(Debug)]
pub enum EditError {
    /// Missing image, missing instruction or an out-of-range adjustment. No request is made.
    ValidationError(String),
    EncodingError(String),
    TransportError(String),
    ProxyRejection { status: u16, message: String },
    ModelEmptyResult(String),
    /// Model-side failure. The detail stays on the server.
    UpstreamFailure(String),
    ConfigError(String),
    SerializationError(String),
    Cancelled,
}

impl EditError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditError::ValidationError(_) => ErrorKind::Validation,
            EditError::EncodingError(_) => ErrorKind::Encoding,
            EditError::TransportError(_) => ErrorKind::Transport,
            EditError::ProxyRejection { .. } => ErrorKind::ProxyRejection,
            EditError::ModelEmptyResult(_) => ErrorKind::ModelEmptyResult,
            EditError::UpstreamFailure(_) => ErrorKind::Upstream,
            EditError::ConfigError(_) => ErrorKind::Config,
            EditError::SerializationError(_) => ErrorKind::Serialization,
            EditError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Short text for the end user.
    pub fn user_message(&self) -> String {
        match self {
            EditError::ValidationError(msg)
            | EditError::EncodingError(msg)
            | EditError::ModelEmptyResult(msg) => msg.clone(),
            EditError::ProxyRejection { message, .. } => message.clone(),
            EditError::TransportError(msg) => format!("Could not reach the edit service: {}", msg),
            EditError::UpstreamFailure(_) => "Failed to generate image from AI model.".to_string(),
            EditError::ConfigError(msg) => format!("Configuration problem: {}", msg),
            EditError::SerializationError(_) => {
                "An unexpected error occurred while generating the image.".to_string()
            }
            EditError::Cancelled => "The edit was cancelled.".to_string(),
        }
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            EditError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            EditError::TransportError(msg) => write!(f, "Transport error: {}", msg),
            EditError::ProxyRejection { status, message } => {
                write!(f, "Proxy rejected request ({}): {}", status, message)
            }
            EditError::ModelEmptyResult(msg) => write!(f, "Empty model result: {}", msg),
            EditError::UpstreamFailure(msg) => write!(f, "Upstream failure: {}", msg),
            EditError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            EditError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            EditError::Cancelled => write!(f, "Edit request cancelled"),
        }
    }
}

impl std::error::Error for EditError {}

impl From<serde_json::Error> for EditError {
    fn from(e: serde_json::Error) -> Self {
        EditError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_detail_is_not_in_user_message() {
        let err = EditError::UpstreamFailure("API key expired for project 1234".into());
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(!err.user_message().contains("1234"));
        assert!(err.to_string().contains("1234"));
    }

    #[test]
    fn rejection_surfaces_server_message() {
        let err = EditError::ProxyRejection {
            status: 400,
            message: "Missing required parameters.".into(),
        };
        assert_eq!(err.kind(), ErrorKind::ProxyRejection);
        assert_eq!(err.user_message(), "Missing required parameters.");
    }
}
