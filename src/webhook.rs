//! Webhook notification: fire-and-forget GETs on status transitions.

use crate::config::WebhookUrls;
use crate::controller::Status;
use std::time::Duration;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Collaborator told about status transitions. Implementations must never
/// block the controller and never surface failures to it.
pub trait Notifier: Send + Sync {
    fn notify(&self, status: Status);
}

/// Used when no webhook client can be built, and in tests.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _status: Status) {}
}

/// Calls the configured webhook URL for a status with a bounded timeout.
/// Requests are spawned onto the captured runtime, so the synchronous
/// controller never waits on network I/O; outcomes are only logged.
pub struct WebhookNotifier {
    client: reqwest::Client,
    urls: WebhookUrls,
    runtime: tokio::runtime::Handle,
}

impl WebhookNotifier {
    pub fn new(urls: WebhookUrls, runtime: tokio::runtime::Handle) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self {
            client,
            urls,
            runtime,
        })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, status: Status) {
        let Some(url) = self.urls.for_status(status) else {
            return;
        };
        let url = url.to_string();
        let client = self.client.clone();
        self.runtime.spawn(async move {
            match client.get(&url).send().await {
                Ok(response) => {
                    tracing::info!("webhook called for {status}: {}", response.status());
                }
                Err(e) if e.is_timeout() => {
                    tracing::warn!("webhook timeout for {status}: {url}");
                }
                Err(e) => {
                    tracing::warn!("webhook error for {status}: {e}");
                }
            }
        });
    }
}
