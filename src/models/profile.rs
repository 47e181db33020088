//! Client profile and account freeze models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mask;

/// Bank mandate as returned by TradeLab.
#[derive(Debug, Clone, Deserialize)]
pub struct TradelabBankDetail {
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub ifsc_code: String,
}

/// Client profile as returned by TradeLab `GET /api/v1/user/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradelabProfile {
    pub client_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email_id: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub pan: String,
    #[serde(default)]
    pub dp_id: Option<String>,
    #[serde(default)]
    pub bank_details: Vec<TradelabBankDetail>,
    #[serde(default)]
    pub exchanges: Vec<String>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub bank_name: String,
    /// Masked
    pub account_number: String,
    pub ifsc: String,
}

/// Client profile returned to internal callers and cached under `profile:<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub client_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Masked
    pub pan: String,
    pub demat_id: Option<String>,
    pub bank_accounts: Vec<BankAccount>,
    pub segments: Vec<String>,
    pub account_status: String,
}

impl From<TradelabProfile> for ProfileResponse {
    fn from(profile: TradelabProfile) -> Self {
        Self {
            client_id: profile.client_id,
            name: profile.name,
            email: profile.email_id,
            phone: profile.mobile_number,
            pan: mask::pan(&profile.pan),
            demat_id: profile.dp_id,
            bank_accounts: profile
                .bank_details
                .into_iter()
                .map(|bank| BankAccount {
                    bank_name: bank.bank_name,
                    account_number: mask::account_number(&bank.account_number),
                    ifsc: bank.ifsc_code,
                })
                .collect(),
            segments: profile.exchanges,
            account_status: profile.status,
        }
    }
}

/// Returned after a freeze OTP has been issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeOtpResponse {
    /// Masked
    pub email: String,
    /// Masked
    pub phone: String,
    pub expires_in_secs: u64,
}

/// Request to freeze the client's trading account.
///
/// # JSON Example
///
/// ```json
/// {
///   "otp": "482913",
///   "reason": "Lost device"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FreezeRequest {
    pub otp: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body for TradeLab `POST /api/v1/user/freeze`.
#[derive(Debug, Serialize)]
pub struct TradelabFreezeRequest<'a> {
    pub client_id: &'a str,
    pub reason: &'a str,
}

/// TradeLab freeze acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct TradelabFreezeAck {
    #[serde(default)]
    pub reference_no: Option<String>,
    #[serde(default)]
    pub status: String,
}

/// Freeze record.
///
/// # Database Table
///
/// Maps to the `account_freezes` table, one row per client.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct AccountFreeze {
    pub client_id: String,
    pub reason: String,
    pub vendor_reference: Option<String>,
    pub is_frozen: bool,
    pub frozen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeResponse {
    pub frozen: bool,
    pub vendor_reference: Option<String>,
    pub vendor_status: String,
    pub frozen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeStatusResponse {
    pub frozen: bool,
    pub reason: Option<String>,
    pub frozen_at: Option<DateTime<Utc>>,
}

impl From<Option<AccountFreeze>> for FreezeStatusResponse {
    fn from(record: Option<AccountFreeze>) -> Self {
        match record {
            Some(freeze) => Self {
                frozen: freeze.is_frozen,
                reason: Some(freeze.reason),
                frozen_at: Some(freeze.frozen_at),
            },
            None => Self {
                frozen: false,
                reason: None,
                frozen_at: None,
            },
        }
    }
}
