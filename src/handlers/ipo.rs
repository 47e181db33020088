//! IPO HTTP handlers.
//!
//! - GET /api/v1/ipo - Categorised IPO listing
//! - GET /api/v1/ipo/orders - Client's applications
//! - POST /api/v1/ipo/orders - Apply
//! - PUT /api/v1/ipo/orders/{application_no} - Modify bids
//! - DELETE /api/v1/ipo/orders/{application_no} - Cancel

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::error::AppError;
use crate::middleware::auth::ClientContext;
use crate::models::ApiResponse;
use crate::models::ipo::{IpoBidRequest, IpoBidResponse, IpoListResponse, IpoOrderResponse};
use crate::services::ipo_service;
use crate::state::AppState;

/// IPO listing split into `all`, `open`, `upcoming` and `closed`.
///
/// The listing is the same for every client and is served from cache when
/// possible.
pub async fn list_ipos(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<IpoListResponse>>, AppError> {
    Ok(Json(ipo_service::list_ipos(&state).await?))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
) -> Result<Json<ApiResponse<Vec<IpoOrderResponse>>>, AppError> {
    Ok(Json(
        ipo_service::list_ipo_orders(&state, &client.client_id).await?,
    ))
}

/// Apply for an IPO.
///
/// # Request Body
///
/// ```json
/// {
///   "symbol": "ACME",
///   "upi_id": "jane@okbank",
///   "bids": [{ "quantity": 50, "price": "120", "cut_off": true }]
/// }
/// ```
pub async fn place_bid(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
    Json(request): Json<IpoBidRequest>,
) -> Result<Json<ApiResponse<IpoBidResponse>>, AppError> {
    Ok(Json(
        ipo_service::place_ipo_bid(&state, &client.client_id, request).await?,
    ))
}

pub async fn modify_bid(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
    Path(application_no): Path<String>,
    Json(request): Json<IpoBidRequest>,
) -> Result<Json<ApiResponse<IpoBidResponse>>, AppError> {
    Ok(Json(
        ipo_service::modify_ipo_bid(&state, &client.client_id, &application_no, request).await?,
    ))
}

pub async fn cancel_bid(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
    Path(application_no): Path<String>,
) -> Result<Json<ApiResponse<IpoBidResponse>>, AppError> {
    Ok(Json(
        ipo_service::cancel_ipo_bid(&state, &client.client_id, &application_no).await?,
    ))
}
