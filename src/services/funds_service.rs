//! Funds service - funds view and payouts through TradeLab.
//!
//! # Payout Ledger
//!
//! A `Payout` row is written to `fund_transactions` only after TradeLab has
//! accepted the payout. The row starts with `tradelab_funds_updated = true`
//! and `backoffice_funds_updated = false`; the reconciliation job owns the
//! second flag.

use rust_decimal::Decimal;

use crate::alert::{self, Severity};
use crate::cache::keys;
use crate::error::AppError;
use crate::mask;
use crate::models::ApiResponse;
use crate::models::funds::{
    FundTransaction, FundsResponse, PayoutRequest, PayoutResponse, TradelabFunds, TradelabPayout,
    TradelabPayoutRequest,
};
use crate::services::{cached, forget, remember};
use crate::state::AppState;
use crate::tradelab::{VendorRequest, paths};

pub const FUNDS_FETCHED: &str = "Funds fetched successfully";
pub const PAYOUT_PLACED: &str = "Payout request placed successfully";

/// Fetch the client's funds summary.
///
/// Always read live. The mapped result is written to `funds:<client_id>` as
/// the last known value, which is served only when TradeLab cannot be
/// reached. Vendor rejections are never masked by the cache.
pub async fn get_funds(
    state: &AppState,
    client_id: &str,
) -> Result<ApiResponse<FundsResponse>, AppError> {
    let key = keys::funds(client_id);
    let request = VendorRequest::get(paths::FUNDS_VIEW)
        .query("client_id", client_id)
        .query("type", "all");

    let vendor: TradelabFunds = match state.tradelab.call("funds.view", request).await {
        Ok(vendor) => vendor,
        Err(err @ AppError::Transport(_)) => {
            return match cached::<FundsResponse>(state, &key).await {
                Some(funds) => {
                    tracing::warn!(
                        client_id = %mask::client_id(client_id),
                        "TradeLab unreachable, serving last known funds"
                    );
                    Ok(ApiResponse::new(FUNDS_FETCHED, funds))
                }
                None => Err(err),
            };
        }
        Err(err) => return Err(err),
    };
    let funds = FundsResponse::from(vendor);

    remember(state, &key, &funds, state.config.funds_cache_ttl()).await;

    Ok(ApiResponse::new(FUNDS_FETCHED, funds))
}

/// Withdraw funds to the client's bank account.
///
/// # Process
///
/// 1. Validate the amount (positive, at most two decimals)
/// 2. Submit the payout to TradeLab
/// 3. On acceptance, record a `Payout` ledger row
/// 4. Invalidate the cached funds summary
///
/// # Errors
///
/// - `InvalidRequest`: amount is zero, negative or too precise
/// - vendor errors as returned by [`crate::tradelab::TradelabClient::call`]
///
/// A ledger write failure after TradeLab acceptance raises a critical alert
/// but still reports success, since the money has already moved.
pub async fn payout(
    state: &AppState,
    client_id: &str,
    request: PayoutRequest,
) -> Result<ApiResponse<PayoutResponse>, AppError> {
    if request.amount <= Decimal::ZERO {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }
    let amount_paise = request.amount_paise().ok_or_else(|| {
        AppError::InvalidRequest("Amount must have at most two decimal places".to_string())
    })?;

    let body = serde_json::to_value(TradelabPayoutRequest {
        client_id,
        amount: request.amount,
        bank_account_no: request.bank_account_no.as_deref(),
    })
    .map_err(|e| AppError::Internal(format!("Failed to encode payout: {e}")))?;

    let vendor: TradelabPayout = state
        .tradelab
        .call("funds.payout", VendorRequest::post(paths::FUNDS_PAYOUT, body))
        .await?;

    let record = FundTransaction::confirmed_payout(client_id, amount_paise, &vendor);
    match state.store.insert_fund_transaction(&record).await {
        Ok(()) => tracing::info!(
            client_id = %mask::client_id(client_id),
            transaction_id = %record.id,
            vendor_reference = %vendor.reference_no,
            amount_paise,
            "Payout recorded"
        ),
        Err(e) => alert::raise(
            Severity::Critical,
            "funds.payout",
            &format!(
                "payout {} ({} paise) accepted by TradeLab but not recorded: {e}",
                vendor.reference_no, amount_paise
            ),
        ),
    }

    forget(state, &keys::funds(client_id)).await;

    Ok(ApiResponse::new(
        PAYOUT_PLACED,
        PayoutResponse {
            transaction_id: record.id,
            vendor_reference: vendor.reference_no,
            amount: request.amount,
            status: vendor.status,
        },
    ))
}
