//! JSON webhook delivery for daily reminders.
//!
//! Each reminder is one `POST` of `{"recipient": ..., "reminder": {...}}`.
//! A 4xx answer means the endpoint refused the recipient; anything else that
//! is not a 2xx is a delivery failure.

use std::time::Duration;

use paydown_core::reminder::{Notifier, Recipient};
use paydown_types::error::NotifyError;
use paydown_types::report::DailyReminder;
use reqwest::Url;
use serde::Serialize;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    recipient: &'a str,
    reminder: &'a DailyReminder,
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self, NotifyError> {
        let url = Url::parse(url)
            .map_err(|e| NotifyError::Delivery(format!("invalid webhook url '{url}': {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Delivery(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        recipient: &Recipient,
        reminder: &DailyReminder,
    ) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            recipient: &recipient.0,
            reminder,
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            Err(NotifyError::Rejected(format!("{recipient}: HTTP {status}: {body}")))
        } else {
            Err(NotifyError::Delivery(format!("HTTP {status}: {body}")))
        }
    }
}
