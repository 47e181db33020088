//! Shared handler state.

use std::sync::Arc;

use crate::cache::Cache;
use crate::config::Config;
use crate::services::notification_service::Notifier;
use crate::store::Store;
use crate::tradelab::TradelabClient;

/// Collaborators shared by every handler via axum `State`.
///
/// Everything is behind an `Arc`, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tradelab: TradelabClient,
    pub cache: Arc<dyn Cache>,
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
}
