//! Client error types

use thiserror::Error;
use wallpaper_core::CoreError;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be built or its body could not be read
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// No response was received from the backend
    #[error("Network unreachable: {message}")]
    NetworkUnreachable { message: String },

    /// The backend answered with a non-200 envelope code
    #[error("Application error {code}: {message}")]
    ApplicationError { code: i64, message: String },

    /// A 401 was observed and recovery did not settle the request
    #[error("Authentication expired")]
    AuthExpired,

    /// The credential refresh call failed; the session is gone
    #[error("Session expired: {message}")]
    RefreshFailed { message: String },

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Configuration source could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Credential storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] CoreError),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Classify an error raised while sending a request
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Request(err)
        } else if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::NetworkUnreachable {
                message: err.to_string(),
            }
        } else {
            Self::Request(err)
        }
    }

    pub fn application(code: i64, message: impl Into<String>) -> Self {
        Self::ApplicationError {
            code,
            message: message.into(),
        }
    }

    pub fn refresh_failed(message: impl Into<String>) -> Self {
        Self::RefreshFailed {
            message: message.into(),
        }
    }

    /// Text suitable for a user-facing notification
    pub fn user_message(&self) -> String {
        match self {
            Self::ApplicationError { message, .. } if message.is_empty() => {
                "Unknown error".to_string()
            }
            Self::ApplicationError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            ClientError::from_status(StatusCode::NOT_FOUND, "gone".into()),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_GATEWAY, "upstream".into()),
            ClientError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn application_error_notification_uses_envelope_message() {
        let error = ClientError::application(500, "category name already exists");
        assert_eq!(error.user_message(), "category name already exists");
        assert_eq!(
            ClientError::application(500, "").user_message(),
            "Unknown error"
        );
    }
}
