//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::cache::CacheError;

/// Message returned whenever the failure detail must not leak to the caller.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong, please try again later";

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Vendor Errors**: TradeLab unreachable, error envelope, non-200 status
/// - **Infrastructure Errors**: database and cache failures
/// - **Authentication Errors**: Invalid or missing internal API key / client id
/// - **Validation Errors**: Invalid request data or OTP
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The vendor could not be reached (connect, timeout, body read).
    ///
    /// Returns HTTP 500 with the generic message.
    #[error("TradeLab transport error: {0}")]
    Transport(String),

    /// The vendor answered with its error envelope.
    ///
    /// Status, message and code are passed through to the caller.
    #[error("TradeLab error {code}: {message}")]
    Vendor {
        status: u16,
        message: String,
        code: String,
    },

    /// The vendor answered with a status other than 200 and no error envelope.
    #[error("TradeLab returned {status}: {message}")]
    VendorStatus { status: u16, message: String },

    /// The vendor success envelope did not match the expected shape.
    #[error("TradeLab response decode error: {0}")]
    Decode(String),

    /// A background task the request was waiting on failed.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Cache operation failed on a path where the cache is required.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Internal API key or client id is missing or invalid.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// No OTP is pending for the client (never issued or expired).
    #[error("OTP expired")]
    OtpExpired,

    /// The submitted OTP does not match the pending one.
    #[error("Invalid OTP")]
    InvalidOtp,
}

impl AppError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Vendor { status, .. } | AppError::VendorStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequest(_) | AppError::OtpExpired | AppError::InvalidOtp => {
                StatusCode::BAD_REQUEST
            }
            AppError::Transport(_)
            | AppError::Decode(_)
            | AppError::Internal(_)
            | AppError::Database(_)
            | AppError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Vendor errors use the vendor's own code and message. Infrastructure
/// failures hide their details behind [`GENERIC_ERROR_MESSAGE`].
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let (code, message) = match self {
            AppError::Vendor { code, message, .. } => (code, message),
            AppError::VendorStatus { message, .. } => ("vendor_error".to_string(), message),
            AppError::Unauthorized => ("unauthorized".to_string(), self.to_string()),
            AppError::InvalidRequest(msg) => ("invalid_request".to_string(), msg),
            AppError::OtpExpired => ("otp_expired".to_string(), self.to_string()),
            AppError::InvalidOtp => ("invalid_otp".to_string(), self.to_string()),
            AppError::Transport(_)
            | AppError::Decode(_)
            | AppError::Internal(_)
            | AppError::Database(_)
            | AppError::Cache(_) => (
                "internal_error".to_string(),
                GENERIC_ERROR_MESSAGE.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
