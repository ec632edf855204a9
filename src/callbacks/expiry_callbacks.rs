use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

use crate::expiry::ExpiryNotice;

/// Delivers expiry reminders. Delivery failures are logged, never returned,
/// so one bad recipient does not stop a sweep.
#[async_trait]
pub trait ExpiryNotifier: Send + Sync {
    async fn notify(&self, notice: &ExpiryNotice);
}

/// Writes each reminder to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl ExpiryNotifier for LogNotifier {
    async fn notify(&self, notice: &ExpiryNotice) {
        info!(
            user_id = %notice.user_id,
            email = %notice.email,
            subscription = ?notice.subscription,
            days_remaining = notice.days_remaining,
            "Subscription expiring soon"
        );
    }
}

/// Forwards each reminder as JSON to an external mail service.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        WebhookNotifier {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ExpiryNotifier for WebhookNotifier {
    async fn notify(&self, notice: &ExpiryNotice) {
        match self.client.post(&self.endpoint).json(notice).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    info!("Expiry notice delivered for user {}", notice.user_id);
                } else {
                    error!(
                        "Failed to deliver expiry notice for user {}. Status: {}. Body: {:?}",
                        notice.user_id,
                        response.status(),
                        response.text().await
                    );
                }
            }
            Err(e) => {
                error!("Error calling notification service for user {}: {}", notice.user_id, e);
            }
        }
    }
}

/// Picks the webhook notifier when a URL is configured, logging otherwise.
pub fn notifier_from_url(webhook_url: Option<&str>) -> Box<dyn ExpiryNotifier> {
    match webhook_url {
        Some(url) if !url.trim().is_empty() => Box::new(WebhookNotifier::new(url.trim())),
        _ => Box::new(LogNotifier),
    }
}
