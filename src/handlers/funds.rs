//! Funds HTTP handlers.
//!
//! - GET /api/v1/funds - Funds summary
//! - POST /api/v1/funds/payout - Withdraw to bank

use axum::{Extension, Json, extract::State};

use crate::error::AppError;
use crate::middleware::auth::ClientContext;
use crate::models::ApiResponse;
use crate::models::funds::{FundsResponse, PayoutRequest, PayoutResponse};
use crate::services::funds_service;
use crate::state::AppState;

/// Funds summary for the calling client.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "message": "Funds fetched successfully",
///   "data": {
///     "available_cash": "15200.50",
///     "withdrawable_balance": "12000.00",
///     "margin_used": "3200.50",
///     ...
///   }
/// }
/// ```
pub async fn get_funds(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
) -> Result<Json<ApiResponse<FundsResponse>>, AppError> {
    let response = funds_service::get_funds(&state, &client.client_id).await?;
    Ok(Json(response))
}

/// Place a payout.
///
/// # Request Body
///
/// ```json
/// {
///   "amount": "2500.75",
///   "bank_account_no": "001234567890"
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: payout accepted by TradeLab
/// - **Error (400)**: invalid amount
/// - **Error (4xx/5xx)**: TradeLab rejection, passed through
pub async fn payout(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
    Json(request): Json<PayoutRequest>,
) -> Result<Json<ApiResponse<PayoutResponse>>, AppError> {
    let response = funds_service::payout(&state, &client.client_id, request).await?;
    Ok(Json(response))
}
