//! HTTP middleware components.

/// Internal API key authentication and client context
pub mod auth;
