//! Bark push notifications for finished runs.
//!
//! Strictly best-effort: missing configuration or any failure is logged and
//! never affects the result of a conversion.

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const BARK_GROUP: &str = "txtbind";
const TIMEOUT_SECS: u64 = 10;

/// Errors from the notification client.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to build notification client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to send notification: {0}")]
    Send(#[source] reqwest::Error),

    #[error("Notification rejected: HTTP {0}")]
    Status(u16),
}

/// Build the Bark request URL: `{base}/{title}/{body}?group=...` with both
/// path segments percent-encoded.
fn build_url(base: &str, title: &str, body: &str) -> String {
    format!(
        "{}/{}/{}?group={}",
        base.trim_end_matches('/'),
        urlencoding::encode(title),
        urlencoding::encode(body),
        BARK_GROUP
    )
}

/// Bark push client over a blocking HTTP client.
#[derive(Debug)]
pub struct BarkNotifier {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl BarkNotifier {
    pub fn new(base_url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(NotifyError::Client)?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn send(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let url = build_url(&self.base_url, title, body);
        let response = self.client.get(&url).send().map_err(NotifyError::Send)?;
        let status = response.status();
        if status.is_success() {
            info!(title = %title, "notification sent");
            Ok(())
        } else {
            Err(NotifyError::Status(status.as_u16()))
        }
    }
}

/// Fire-and-forget notification. No configured URL means no-op.
pub fn notify_best_effort(bark_url: Option<&str>, title: &str, body: &str) {
    let Some(url) = bark_url else {
        debug!("no bark_url configured, skipping notification");
        return;
    };
    if let Err(e) = BarkNotifier::new(url).and_then(|n| n.send(title, body)) {
        warn!(error = %e, "could not send notification");
    }
}
