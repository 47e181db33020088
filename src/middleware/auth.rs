//! Internal API key authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the API key from the Authorization header
//! 2. Hash it and compare against the configured hash
//! 3. Read the client id from `X-Client-Id`
//! 4. Inject [`ClientContext`] into the request

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::{error::AppError, state::AppState};

pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

/// Client on whose behalf the request is made.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<ClientContext>`.
#[derive(Debug, Clone)]
pub struct ClientContext {
    /// TradeLab client code (UCC)
    pub client_id: String,
}

/// Authentication middleware function.
///
/// # Headers
///
/// ```text
/// Authorization: Bearer <internal api key>
/// X-Client-Id: AB1234
/// ```
///
/// # Returns
///
/// - `Ok(Response)` if authenticated (calls next handler)
/// - `Err(AppError::Unauthorized)` otherwise (returns 401)
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let key_hash = hex::encode(Sha256::digest(api_key.as_bytes()));
    if !key_hash.eq_ignore_ascii_case(&state.config.internal_api_key_hash) {
        tracing::warn!("Rejected request with unknown API key");
        return Err(AppError::Unauthorized);
    }

    let client_id = request
        .headers()
        .get(CLIENT_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    request.extensions_mut().insert(ClientContext { client_id });

    Ok(next.run(request).await)
}
