//! Profile service - client profile and the account freeze workflow.
//!
//! # Freeze Flow
//!
//! 1. `request_freeze_otp`: issue a six digit OTP, cache its HMAC digest,
//!    send it by email and SMS in the background
//! 2. `freeze_account`: verify and consume the OTP, freeze at TradeLab,
//!    record the freeze locally
//!
//! The raw OTP never reaches the cache or the logs. An OTP is consumed with
//! an atomic take, so concurrent submissions freeze at most once, and it is
//! discarded after [`MAX_OTP_ATTEMPTS`] wrong guesses.

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::alert::{self, Severity};
use crate::cache::keys;
use crate::error::AppError;
use crate::mask;
use crate::models::ApiResponse;
use crate::models::profile::{
    AccountFreeze, FreezeOtpResponse, FreezeRequest, FreezeResponse, FreezeStatusResponse,
    ProfileResponse, TradelabFreezeAck, TradelabFreezeRequest, TradelabProfile,
};
use crate::services::notification_service;
use crate::services::{cached, forget, remember};
use crate::state::AppState;
use crate::tradelab::{VendorRequest, paths};

type HmacSha256 = Hmac<Sha256>;

pub const PROFILE_FETCHED: &str = "Profile fetched successfully";
pub const FREEZE_OTP_SENT: &str = "OTP sent successfully";
pub const ACCOUNT_FROZEN: &str = "Account frozen successfully";
pub const FREEZE_STATUS_FETCHED: &str = "Freeze status fetched successfully";

const DEFAULT_FREEZE_REASON: &str = "Requested by client";

/// Wrong guesses allowed per issued OTP.
pub const MAX_OTP_ATTEMPTS: i64 = 5;

/// Client profile, served from `profile:<client_id>` when cached.
pub async fn get_profile(
    state: &AppState,
    client_id: &str,
) -> Result<ApiResponse<ProfileResponse>, AppError> {
    let profile = load_profile(state, client_id).await?;
    Ok(ApiResponse::new(PROFILE_FETCHED, profile))
}

async fn load_profile(state: &AppState, client_id: &str) -> Result<ProfileResponse, AppError> {
    let key = keys::profile(client_id);
    if let Some(profile) = cached::<ProfileResponse>(state, &key).await {
        return Ok(profile);
    }

    let request = VendorRequest::get(paths::USER_PROFILE).query("client_id", client_id);
    let vendor: TradelabProfile = state.tradelab.call("profile.get", request).await?;
    let profile = ProfileResponse::from(vendor);

    remember(state, &key, &profile, state.config.profile_cache_ttl()).await;

    Ok(profile)
}

/// Issue a freeze OTP to the contacts on file.
///
/// # Errors
///
/// - `InvalidRequest`: the profile has neither email nor phone
/// - `Cache`: the OTP digest could not be stored
pub async fn request_freeze_otp(
    state: &AppState,
    client_id: &str,
) -> Result<ApiResponse<FreezeOtpResponse>, AppError> {
    let profile = load_profile(state, client_id).await?;
    if profile.email.is_empty() && profile.phone.is_empty() {
        return Err(AppError::InvalidRequest(
            "No email or phone on file".to_string(),
        ));
    }

    let otp = generate_otp();
    let digest = otp_digest(&state.config.otp_secret, client_id, &otp)?;
    let ttl = state.config.otp_ttl();

    // Without a stored digest the OTP could never be verified
    state
        .cache
        .delete(&keys::freeze_otp_attempts(client_id))
        .await?;
    state
        .cache
        .set(&keys::freeze_otp(client_id), &digest, ttl)
        .await?;

    let text = format!(
        "{otp} is your OTP to freeze your trading account. It is valid for {} minutes. Do not share it with anyone.",
        ttl.as_secs().div_ceil(60)
    );
    if !profile.email.is_empty() {
        notification_service::send_email(
            state.notifier.clone(),
            &profile.email,
            "Account freeze OTP",
            &text,
        );
    }
    if !profile.phone.is_empty() {
        notification_service::send_sms(state.notifier.clone(), &profile.phone, &text);
    }

    tracing::info!(client_id = %mask::client_id(client_id), "Freeze OTP issued");

    Ok(ApiResponse::new(
        FREEZE_OTP_SENT,
        FreezeOtpResponse {
            email: mask::email(&profile.email),
            phone: mask::phone(&profile.phone),
            expires_in_secs: ttl.as_secs(),
        },
    ))
}

/// Verify the OTP and freeze the account.
///
/// The OTP is consumed before TradeLab is called, so a vendor failure
/// requires a fresh OTP.
///
/// # Errors
///
/// - `OtpExpired`: no OTP pending, or another request consumed it first
/// - `InvalidOtp`: OTP does not match
/// - vendor errors as returned by [`crate::tradelab::TradelabClient::call`]
pub async fn freeze_account(
    state: &AppState,
    client_id: &str,
    request: FreezeRequest,
) -> Result<ApiResponse<FreezeResponse>, AppError> {
    let key = keys::freeze_otp(client_id);
    let attempts_key = keys::freeze_otp_attempts(client_id);
    let stored = state.cache.get(&key).await?.ok_or(AppError::OtpExpired)?;

    if !verify_otp(&state.config.otp_secret, client_id, request.otp.trim(), &stored)? {
        let attempts = state
            .cache
            .incr(&attempts_key, state.config.otp_ttl())
            .await?;
        alert::raise(
            Severity::Low,
            "profile.freeze",
            &format!(
                "invalid freeze OTP for {} (attempt {attempts})",
                mask::client_id(client_id)
            ),
        );
        if attempts >= MAX_OTP_ATTEMPTS {
            state.cache.delete(&key).await?;
            alert::raise(
                Severity::Medium,
                "profile.freeze",
                &format!(
                    "freeze OTP for {} discarded after {attempts} wrong attempts",
                    mask::client_id(client_id)
                ),
            );
        }
        return Err(AppError::InvalidOtp);
    }

    // Only the request that removes the digest may go on to the vendor
    match state.cache.take(&key).await? {
        Some(taken) if taken == stored => {}
        _ => return Err(AppError::OtpExpired),
    }
    forget(state, &attempts_key).await;

    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_FREEZE_REASON);

    let body = serde_json::to_value(TradelabFreezeRequest { client_id, reason })
        .map_err(|e| AppError::Internal(format!("Failed to encode freeze: {e}")))?;
    let ack: TradelabFreezeAck = state
        .tradelab
        .call("profile.freeze", VendorRequest::post(paths::USER_FREEZE, body))
        .await?;

    let record = AccountFreeze {
        client_id: client_id.to_string(),
        reason: reason.to_string(),
        vendor_reference: ack.reference_no.clone(),
        is_frozen: true,
        frozen_at: Utc::now(),
    };
    if let Err(e) = state.store.upsert_account_freeze(&record).await {
        alert::raise(
            Severity::Critical,
            "profile.freeze",
            &format!(
                "account {} frozen at TradeLab but not recorded: {e}",
                mask::client_id(client_id)
            ),
        );
    }

    forget(state, &keys::profile(client_id)).await;

    tracing::info!(client_id = %mask::client_id(client_id), "Account frozen");

    Ok(ApiResponse::new(
        ACCOUNT_FROZEN,
        FreezeResponse {
            frozen: true,
            vendor_reference: ack.reference_no,
            vendor_status: ack.status,
            frozen_at: record.frozen_at,
        },
    ))
}

/// Local freeze record for the client.
pub async fn freeze_status(
    state: &AppState,
    client_id: &str,
) -> Result<ApiResponse<FreezeStatusResponse>, AppError> {
    let record = state.store.find_account_freeze(client_id).await?;
    Ok(ApiResponse::new(FREEZE_STATUS_FETCHED, record.into()))
}

fn generate_otp() -> String {
    rand::rng().random_range(100_000..=999_999u32).to_string()
}

fn otp_mac(secret: &str, client_id: &str, otp: &str) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("OTP key rejected: {e}")))?;
    mac.update(client_id.as_bytes());
    mac.update(b":");
    mac.update(otp.as_bytes());
    Ok(mac)
}

/// Hex HMAC-SHA256 of `client_id:otp`, bound to the client so a digest
/// cannot be replayed for another account.
fn otp_digest(secret: &str, client_id: &str, otp: &str) -> Result<String, AppError> {
    let mac = otp_mac(secret, client_id, otp)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison against the stored digest.
fn verify_otp(secret: &str, client_id: &str, otp: &str, stored: &str) -> Result<bool, AppError> {
    let Ok(expected) = hex::decode(stored) else {
        return Ok(false);
    };
    Ok(otp_mac(secret, client_id, otp)?
        .verify_slice(&expected)
        .is_ok())
}
