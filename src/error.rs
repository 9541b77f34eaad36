#[cfg(feature = "web")]
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::core::search::SearchError;
use crate::provider::ProviderError;

/// Troubleshooting pointers shown when the model service denies access.
pub const ACCESS_DENIED_HELP: &str = "To troubleshoot this issue please refer to the following resources:\n\
    https://docs.aws.amazon.com/IAM/latest/UserGuide/troubleshoot_access-denied.html\n\
    https://docs.aws.amazon.com/bedrock/latest/userguide/security-iam.html";

/// Shown when a search runs before any image was generated.
pub const EMPTY_CATALOG_MESSAGE: &str =
    "No images available to search. Please generate images first.";

/// Main error type for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Saving a generated image failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generated image could not be decoded or re-encoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request body that does not match the expected shape
    #[error("Validation error: {0}")]
    Validation(String),

    /// Embedding store errors
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Remote model errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Standard error response format
#[derive(Serialize)]
#[derive(Debug)]
pub struct ErrorResponse {
    /// Error code (HTTP status code)
    pub code: u16,
    /// Error message
    pub message: String,
    /// Optional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    #[cfg(feature = "web")]
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Search(SearchError::EmptyStore) => StatusCode::CONFLICT,
            Self::Search(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Provider(ProviderError::AccessDenied { .. }) => StatusCode::FORBIDDEN,
            Self::Provider(ProviderError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert the error to a JSON response
    pub fn to_json(&self) -> ErrorResponse {
        #[cfg(feature = "web")]
        let code = self.status_code().as_u16();
        #[cfg(not(feature = "web"))]
        let code = 500u16;

        match self {
            Self::Search(SearchError::EmptyStore) => ErrorResponse {
                code,
                message: EMPTY_CATALOG_MESSAGE.to_string(),
                details: None,
            },
            Self::Provider(ProviderError::AccessDenied { message }) => ErrorResponse {
                code,
                message: message.clone(),
                details: Some(ACCESS_DENIED_HELP.to_string()),
            },
            _ => ErrorResponse {
                code,
                message: self.to_string(),
                details: None,
            },
        }
    }
}

#[cfg(feature = "web")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }
        let response = self.to_json();

        (status, Json(response)).into_response()
    }
}

#[cfg(feature = "web")]
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Extension trait for working with Results
pub trait ResultExt<T> {
    /// Turn the error into [`AppError::Internal`] prefixed with `context`
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Like [`ResultExt::context`], building the prefix only on error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| AppError::Internal(format!("{}: {}", context, e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let context = f();
            AppError::Internal(format!("{}: {}", context, e))
        })
    }
}
