//! Funds data models and API request/response types.
//!
//! This module defines:
//! - `TradelabFunds` / `TradelabPayout`: vendor payloads
//! - `FundsResponse` / `PayoutRequest` / `PayoutResponse`: internal API types
//! - `FundTransaction`: ledger row written after a confirmed payout

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Funds view as returned by TradeLab `GET /api/v1/funds/view`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradelabFunds {
    pub client_id: String,
    #[serde(default)]
    pub cash_available: Decimal,
    #[serde(default)]
    pub withdrawal_amount: Decimal,
    #[serde(default)]
    pub utilized_margin: Decimal,
    #[serde(default)]
    pub collateral_value: Decimal,
    #[serde(default)]
    pub pay_in: Decimal,
    #[serde(default)]
    pub pay_out: Decimal,
    #[serde(default)]
    pub opening_balance: Decimal,
    #[serde(default)]
    pub unrealized_mtm: Decimal,
}

/// Funds summary returned to internal callers.
///
/// # JSON Example
///
/// ```json
/// {
///   "client_id": "AB1234",
///   "available_cash": "15200.50",
///   "withdrawable_balance": "12000.00",
///   "margin_used": "3200.50",
///   "collateral": "0",
///   "payin": "5000",
///   "payout": "0",
///   "opening_balance": "10200.50",
///   "unrealised_mtm": "-120.25"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundsResponse {
    pub client_id: String,
    pub available_cash: Decimal,
    pub withdrawable_balance: Decimal,
    pub margin_used: Decimal,
    pub collateral: Decimal,
    pub payin: Decimal,
    pub payout: Decimal,
    pub opening_balance: Decimal,
    pub unrealised_mtm: Decimal,
}

impl From<TradelabFunds> for FundsResponse {
    fn from(funds: TradelabFunds) -> Self {
        Self {
            client_id: funds.client_id,
            available_cash: funds.cash_available,
            withdrawable_balance: funds.withdrawal_amount,
            margin_used: funds.utilized_margin,
            collateral: funds.collateral_value,
            payin: funds.pay_in,
            payout: funds.pay_out,
            opening_balance: funds.opening_balance,
            unrealised_mtm: funds.unrealized_mtm,
        }
    }
}

/// Request to withdraw funds to the client's registered bank account.
///
/// # JSON Example
///
/// ```json
/// {
///   "amount": "2500.00",
///   "bank_account_no": "001234567890"
/// }
/// ```
///
/// # Validation
///
/// - Amount must be positive
/// - Amount must have at most two decimal places
#[derive(Debug, Clone, Deserialize)]
pub struct PayoutRequest {
    pub amount: Decimal,

    /// Omit to use the vendor's primary bank account.
    pub bank_account_no: Option<String>,
}

impl PayoutRequest {
    /// Amount in paise, `None` when it does not fit or has sub-paise precision.
    pub fn amount_paise(&self) -> Option<i64> {
        if self.amount.round_dp(2) != self.amount {
            return None;
        }
        (self.amount * Decimal::ONE_HUNDRED).to_i64()
    }
}

/// Payout body sent to TradeLab `POST /api/v1/funds/payout`.
#[derive(Debug, Serialize)]
pub struct TradelabPayoutRequest<'a> {
    pub client_id: &'a str,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_no: Option<&'a str>,
}

/// TradeLab payout acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct TradelabPayout {
    pub reference_no: String,
    #[serde(default = "pending_status")]
    pub status: String,
}

fn pending_status() -> String {
    "PENDING".to_string()
}

/// Payout result returned to internal callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutResponse {
    /// Id of the ledger row written for this payout
    pub transaction_id: Uuid,
    pub vendor_reference: String,
    pub amount: Decimal,
    pub status: String,
}

/// Ledger row for a vendor-confirmed fund movement.
///
/// # Database Table
///
/// Maps to the `fund_transactions` table. The reconciliation job picks up
/// rows where `tradelab_funds_updated` is set and `backoffice_funds_updated`
/// is not, and flips the latter once the back office has been posted.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct FundTransaction {
    pub id: Uuid,
    pub client_id: String,
    pub transaction_type: String,
    pub amount_paise: i64,
    pub vendor_reference: Option<String>,
    pub status: String,
    pub tradelab_funds_updated: bool,
    pub backoffice_funds_updated: bool,
    pub created_at: DateTime<Utc>,
}

impl FundTransaction {
    pub const PAYOUT: &'static str = "Payout";

    /// Ledger row for a payout TradeLab has just accepted.
    pub fn confirmed_payout(client_id: &str, amount_paise: i64, vendor: &TradelabPayout) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id: client_id.to_string(),
            transaction_type: Self::PAYOUT.to_string(),
            amount_paise,
            vendor_reference: Some(vendor.reference_no.clone()),
            status: vendor.status.clone(),
            tradelab_funds_updated: true,
            backoffice_funds_updated: false,
            created_at: Utc::now(),
        }
    }
}
