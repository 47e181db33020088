//! TradeLab vendor API client.
//!
//! [`TradelabClient::call`] is the single path every service uses to reach
//! the vendor. It applies the three-tier error handling:
//!
//! 1. transport failure -> [`AppError::Transport`] (500, generic message)
//! 2. vendor error envelope -> [`AppError::Vendor`] (vendor status, message, code)
//! 3. non-200 status -> [`AppError::VendorStatus`] (vendor status, message)
//!
//! and raises a severity-tagged alert for each.

pub mod envelope;
pub mod transport;

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;

use crate::alert::{self, Severity};
use crate::error::AppError;

pub use transport::{HttpTransport, TransportError, VendorReply, VendorRequest, VendorTransport};

/// Vendor endpoint paths, relative to `TRADELAB_BASE_URL`.
pub mod paths {
    pub const FUNDS_VIEW: &str = "/api/v1/funds/view";
    pub const FUNDS_PAYOUT: &str = "/api/v1/funds/payout";
    pub const IPO_LIST: &str = "/api/v1/ipo/list";
    pub const IPO_ORDERS: &str = "/api/v1/ipo/orders";
    pub const IPO_BID: &str = "/api/v1/ipo/bid";
    pub const USER_PROFILE: &str = "/api/v1/user/profile";
    pub const USER_FREEZE: &str = "/api/v1/user/freeze";
}

#[derive(Clone)]
pub struct TradelabClient {
    transport: Arc<dyn VendorTransport>,
}

impl TradelabClient {
    pub fn new(transport: Arc<dyn VendorTransport>) -> Self {
        Self { transport }
    }

    /// Send `request` and decode the `data` payload of a success envelope.
    ///
    /// `operation` names the calling adapter operation in logs and alerts.
    pub async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: VendorRequest,
    ) -> Result<T, AppError> {
        let started = Instant::now();

        let reply = match self.transport.send(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                alert::raise(Severity::High, operation, &format!("TradeLab unreachable: {e}"));
                return Err(AppError::Transport(e.to_string()));
            }
        };

        tracing::info!(
            operation,
            method = %request.method,
            path = request.path,
            status = reply.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "TradeLab call completed"
        );

        envelope::interpret(&reply).inspect_err(|err| match err {
            AppError::Vendor { status, code, .. } => alert::raise(
                Severity::Medium,
                operation,
                &format!("TradeLab error envelope {code} with status {status}"),
            ),
            AppError::VendorStatus { status, .. } => alert::raise(
                if *status >= 500 {
                    Severity::High
                } else {
                    Severity::Medium
                },
                operation,
                &format!("TradeLab returned status {status}"),
            ),
            other => alert::raise(Severity::High, operation, &other.to_string()),
        })
    }
}
