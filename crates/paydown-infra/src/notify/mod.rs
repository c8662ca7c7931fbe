//! Reminder delivery channels.
//!
//! Implements the `Notifier` port from `paydown-core`. The webhook notifier
//! POSTs each reminder as JSON; the log notifier writes it to the trace log
//! and is used when no webhook is configured.

pub mod log;
pub mod webhook;

use paydown_core::reminder::{Notifier, Recipient};
use paydown_types::config::PaydownConfig;
use paydown_types::error::NotifyError;
use paydown_types::report::DailyReminder;

pub use self::log::LogNotifier;
pub use self::webhook::WebhookNotifier;

/// The notifier selected by configuration.
pub enum ConfiguredNotifier {
    Webhook(WebhookNotifier),
    Log(LogNotifier),
}

impl ConfiguredNotifier {
    /// Webhook delivery when `webhook_url` is set, log-only otherwise.
    pub fn from_config(config: &PaydownConfig) -> Result<Self, NotifyError> {
        match config.webhook_url.as_deref() {
            Some(url) => Ok(Self::Webhook(WebhookNotifier::new(url)?)),
            None => Ok(Self::Log(LogNotifier)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Webhook(_) => "webhook",
            Self::Log(_) => "log",
        }
    }
}

impl Notifier for ConfiguredNotifier {
    async fn notify(
        &self,
        recipient: &Recipient,
        reminder: &DailyReminder,
    ) -> Result<(), NotifyError> {
        match self {
            Self::Webhook(n) => n.notify(recipient, reminder).await,
            Self::Log(n) => n.notify(recipient, reminder).await,
        }
    }
}
