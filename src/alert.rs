//! Severity-tagged operational alerts.
//!
//! Alerts are ordinary `tracing` events carrying `alert = true` and a
//! `severity` field, so the log pipeline can route them to paging without a
//! separate client.

use std::fmt;

/// How urgently an alert needs a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    /// Money moved at the vendor but our own records may be incomplete.
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit an alert event.
///
/// `operation` names the adapter operation (e.g. `funds.payout`), `detail`
/// is free text and must already be masked.
pub fn raise(severity: Severity, operation: &str, detail: &str) {
    match severity {
        Severity::Low => tracing::info!(
            alert = true,
            severity = %severity,
            operation,
            detail
        ),
        Severity::Medium => tracing::warn!(
            alert = true,
            severity = %severity,
            operation,
            detail
        ),
        Severity::High | Severity::Critical => tracing::error!(
            alert = true,
            severity = %severity,
            operation,
            detail
        ),
    }
}
