//! Business logic services.
//!
//! Services contain the per-operation flow separated from HTTP handlers:
//! build the vendor request, call TradeLab, map the payload, apply cache and
//! database side effects.

pub mod funds_service;
pub mod ipo_service;
pub mod notification_service;
pub mod profile_service;

use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};

use crate::cache;
use crate::state::AppState;

/// Key prefix only; the rest of a key usually carries a client id.
fn key_prefix(key: &str) -> &str {
    key.split(':').next().unwrap_or(key)
}

/// Read a cached value. Cache failures are logged and read as a miss.
pub(crate) async fn cached<T: DeserializeOwned>(state: &AppState, key: &str) -> Option<T> {
    match cache::get_json(state.cache.as_ref(), key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(cache = key_prefix(key), error = %e, "Cache read failed, bypassing");
            None
        }
    }
}

/// Write a cached value. Failures are logged and ignored.
pub(crate) async fn remember<T: Serialize + Sync>(
    state: &AppState,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    if let Err(e) = cache::set_json(state.cache.as_ref(), key, value, ttl).await {
        tracing::warn!(cache = key_prefix(key), error = %e, "Cache write failed, bypassing");
    }
}

/// Drop a cached value. Failures are logged and ignored; the entry expires on its own.
pub(crate) async fn forget(state: &AppState, key: &str) {
    if let Err(e) = state.cache.delete(key).await {
        tracing::warn!(cache = key_prefix(key), error = %e, "Cache invalidation failed");
    }
}
