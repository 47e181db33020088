//! TradeLab envelope interpretation.
//!
//! TradeLab wraps every payload as
//!
//! ```json
//! { "status": "success", "message": "", "data": { ... } }
//! ```
//!
//! and reports failures as
//!
//! ```json
//! { "status": "error", "message": "Invalid client", "error_code": "CLIENT_404" }
//! ```
//!
//! The error envelope can arrive with any HTTP status, including 200.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::transport::VendorReply;
use crate::error::AppError;

const DEFAULT_ERROR_CODE: &str = "TRADELAB_ERROR";
const DEFAULT_ERROR_MESSAGE: &str = "TradeLab request failed";

#[derive(Debug, Deserialize)]
struct SuccessEnvelope<T> {
    data: T,
}

/// `Some` when the body is a vendor error envelope.
///
/// A 2xx status carrying an error envelope is reported as 400 so callers
/// never see a failure with a success status.
pub fn parse_error_envelope(status: u16, body: &Value) -> Option<AppError> {
    let is_error_status = body
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("error"));
    let error_code = body.get("error_code").and_then(text_of);

    if !is_error_status && error_code.is_none() {
        return None;
    }

    // `code` is only trusted once the body is known to be an error
    let code = error_code.or_else(|| body.get("code").and_then(text_of));

    let status = if (200..300).contains(&status) {
        400
    } else {
        status
    };

    Some(AppError::Vendor {
        status,
        message: message_of(body).unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
        code: code.unwrap_or_else(|| DEFAULT_ERROR_CODE.to_string()),
    })
}

/// Turn a raw reply into the typed `data` payload or the matching [`AppError`].
pub fn interpret<T: DeserializeOwned>(reply: &VendorReply) -> Result<T, AppError> {
    let parsed: Option<Value> = serde_json::from_str(&reply.body).ok();

    if let Some(err) = parsed
        .as_ref()
        .and_then(|body| parse_error_envelope(reply.status, body))
    {
        return Err(err);
    }

    if reply.status != 200 {
        // Only a JSON `message` is passed on; raw bodies never reach callers
        let message = parsed
            .as_ref()
            .and_then(message_of)
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
        return Err(AppError::VendorStatus {
            status: unexpected_status(reply.status),
            message,
        });
    }

    let body = parsed.ok_or_else(|| AppError::Decode("response is not JSON".to_string()))?;
    serde_json::from_value::<SuccessEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| AppError::Decode(e.to_string()))
}

/// A failure must not be reported with a success status, so any other 2xx
/// from the vendor becomes 502.
fn unexpected_status(status: u16) -> u16 {
    if (200..300).contains(&status) {
        502
    } else {
        status
    }
}

fn message_of(body: &Value) -> Option<String> {
    body.get("message").and_then(text_of)
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
