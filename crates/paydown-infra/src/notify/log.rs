use paydown_core::reminder::{Notifier, Recipient};
use paydown_types::error::NotifyError;
use paydown_types::report::DailyReminder;

/// Writes reminders to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: &Recipient,
        reminder: &DailyReminder,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            %recipient,
            date = %reminder.date,
            daily_target = reminder.daily_target,
            remaining = reminder.remaining,
            days_left = reminder.days_left,
            "daily reminder"
        );
        Ok(())
    }
}
