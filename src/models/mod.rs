//! Vendor and internal data models.
//!
//! Each domain module holds three kinds of types:
//! - `Tradelab*`: shapes deserialized from the TradeLab `data` payload
//! - `*Request` / `*Response`: the internal API surface
//! - database rows written as side effects
//!
//! Vendor -> internal mapping is done with `From` impls next to the types.

use serde::{Deserialize, Serialize};

/// Funds view and payout models
pub mod funds;
/// IPO listing, order book and bid models
pub mod ipo;
/// Client profile and account freeze models
pub mod profile;

/// Success body returned by every internal endpoint.
///
/// # JSON Example
///
/// ```json
/// {
///   "message": "Funds fetched successfully",
///   "data": { "available_cash": "1520.75" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: &str, data: T) -> Self {
        Self {
            message: message.to_string(),
            data,
        }
    }
}
