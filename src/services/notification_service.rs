//! Email/SMS notification publishing.
//!
//! Notifications are best effort: [`dispatch`] spawns the delivery and
//! returns immediately. Failures are logged, never retried, and never reach
//! the request that triggered them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::mask;

/// A message for the notification publisher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum Notification {
    Email {
        to: String,
        subject: String,
        body: String,
    },
    Sms {
        to: String,
        body: String,
    },
}

impl Notification {
    fn channel(&self) -> &'static str {
        match self {
            Notification::Email { .. } => "email",
            Notification::Sms { .. } => "sms",
        }
    }

    fn masked_recipient(&self) -> String {
        match self {
            Notification::Email { to, .. } => mask::email(to),
            Notification::Sms { to, .. } => mask::phone(to),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid notification URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("publisher rejected notification with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// [`Notifier`] posting JSON to the notification publisher.
///
/// # Endpoints
///
/// - `POST {base}/email`
/// - `POST {base}/sms`
///
/// # Timeout
///
/// 5 seconds per delivery
pub struct HttpNotifier {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpNotifier {
    pub fn new(base_url: &str) -> Result<Self, NotifyError> {
        let mut base_url = Url::parse(base_url)?;
        // join() replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Publisher URL for `channel`, below the configured base path.
    fn endpoint(&self, channel: &str) -> Result<Url, NotifyError> {
        Ok(self.base_url.join(channel)?)
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let url = self.endpoint(notification.channel())?;

        let response = self.client.post(url).json(notification).send().await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Queue an email; see [`dispatch`].
pub fn send_email(notifier: Arc<dyn Notifier>, to: &str, subject: &str, body: &str) {
    dispatch(
        notifier,
        Notification::Email {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        },
    );
}

/// Queue an SMS; see [`dispatch`].
pub fn send_sms(notifier: Arc<dyn Notifier>, to: &str, body: &str) {
    dispatch(
        notifier,
        Notification::Sms {
            to: to.to_string(),
            body: body.to_string(),
        },
    );
}

/// Deliver in the background; the caller never waits on the publisher.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::spawn(async move {
        let channel = notification.channel();
        let recipient = notification.masked_recipient();

        match notifier.deliver(&notification).await {
            Ok(()) => tracing::debug!(channel, recipient = %recipient, "Notification delivered"),
            Err(e) => {
                tracing::warn!(channel, recipient = %recipient, error = %e, "Notification failed")
            }
        }
    });
}
