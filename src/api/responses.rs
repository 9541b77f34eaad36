use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// JSON envelope shared by the successful API responses and the 404 fallback.
///
/// Handler failures are rendered by [`crate::error::AppError`] instead.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// `true` when `data` is present
    pub success: bool,
    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Reason the request was not served
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a payload
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Envelope without payload
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        // Callers pair failures with their own status
        let status = match self.success {
            true => StatusCode::OK,
            false => StatusCode::BAD_REQUEST,
        };
        (status, Json(self)).into_response()
    }
}

/// Payload of `GET /api/health`
#[derive(Debug, Serialize)]
pub struct Health {
    /// Always `"ok"`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Build time (RFC 2822)
    pub built_at: &'static str,
    /// Active provider
    pub provider: String,
    /// Number of indexed product images, `None` while a product action runs
    pub indexed_images: Option<usize>,
}
