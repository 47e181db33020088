//! HTTP request handlers (route handlers).
//!
//! Each handler extracts the caller's [`crate::middleware::auth::ClientContext`]
//! and request data, delegates to a service and wraps the result as JSON.

/// Funds view and payout
pub mod funds;
pub mod health;
/// IPO listing and bids
pub mod ipo;
/// Profile and account freeze
pub mod profile;
