//! Profile and account freeze HTTP handlers.
//!
//! - GET /api/v1/profile - Client profile
//! - POST /api/v1/profile/freeze/otp - Issue freeze OTP
//! - POST /api/v1/profile/freeze - Freeze with OTP
//! - GET /api/v1/profile/freeze - Local freeze status

use axum::{Extension, Json, extract::State};

use crate::error::AppError;
use crate::middleware::auth::ClientContext;
use crate::models::ApiResponse;
use crate::models::profile::{
    FreezeOtpResponse, FreezeRequest, FreezeResponse, FreezeStatusResponse, ProfileResponse,
};
use crate::services::profile_service;
use crate::state::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
) -> Result<Json<ApiResponse<ProfileResponse>>, AppError> {
    Ok(Json(
        profile_service::get_profile(&state, &client.client_id).await?,
    ))
}

/// Send a freeze OTP to the email and phone on file.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "message": "OTP sent successfully",
///   "data": { "email": "ja**@example.com", "phone": "******3210", "expires_in_secs": 300 }
/// }
/// ```
pub async fn request_freeze_otp(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
) -> Result<Json<ApiResponse<FreezeOtpResponse>>, AppError> {
    Ok(Json(
        profile_service::request_freeze_otp(&state, &client.client_id).await?,
    ))
}

/// Freeze the account.
///
/// # Request Body
///
/// ```json
/// { "otp": "482913", "reason": "Lost device" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: frozen at TradeLab
/// - **Error (400)**: `otp_expired` or `invalid_otp`
pub async fn freeze_account(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
    Json(request): Json<FreezeRequest>,
) -> Result<Json<ApiResponse<FreezeResponse>>, AppError> {
    Ok(Json(
        profile_service::freeze_account(&state, &client.client_id, request).await?,
    ))
}

pub async fn freeze_status(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
) -> Result<Json<ApiResponse<FreezeStatusResponse>>, AppError> {
    Ok(Json(
        profile_service::freeze_status(&state, &client.client_id).await?,
    ))
}
