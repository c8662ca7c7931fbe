//! Daily reminder: the scheduled day-boundary run and its delivery port.

pub mod scheduler;

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use paydown_types::error::{LedgerError, NotifyError};
use paydown_types::report::DailyReminder;
use serde::{Deserialize, Serialize};

use crate::repository::LedgerStore;
use crate::service::LedgerService;

/// Opaque handle identifying where a reminder is delivered (a chat id, an
/// address, ...). Only the notifier interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient(pub String);

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery channel for daily reminders.
///
/// Implementations live in paydown-infra (webhook, log).
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        recipient: &Recipient,
        reminder: &DailyReminder,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

/// Calendar date at `instant` in the zone given by `offset`.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// Run the day-boundary sequence for `today` and notify every recipient.
///
/// A failed delivery is logged and does not stop delivery to the others;
/// only ledger errors are returned.
pub async fn send_daily_reminder<S: LedgerStore, N: Notifier>(
    service: &LedgerService<S>,
    notifier: &N,
    recipients: &[Recipient],
    today: NaiveDate,
) -> Result<DailyReminder, LedgerError> {
    let start = service.begin_day(today).await?;
    let reminder = DailyReminder::from_pool(today, &start.pool);

    for recipient in recipients {
        match notifier.notify(recipient, &reminder).await {
            Ok(()) => tracing::debug!(%recipient, "daily reminder delivered"),
            Err(e) => tracing::warn!(%recipient, error = %e, "daily reminder delivery failed"),
        }
    }

    Ok(reminder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::InMemoryLedgerStore;
    use chrono::TimeZone;
    use paydown_types::loan::{LoanKind, NewLoan};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(Recipient, DailyReminder)>>,
        reject: Option<String>,
    }

    impl Notifier for RecordingNotifier {
        async fn notify(
            &self,
            recipient: &Recipient,
            reminder: &DailyReminder,
        ) -> Result<(), NotifyError> {
            if self.reject.as_deref() == Some(recipient.0.as_str()) {
                return Err(NotifyError::Rejected(recipient.0.clone()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.clone(), reminder.clone()));
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        let instant = Utc.with_ymd_and_hms(2025, 8, 31, 22, 0, 0).unwrap();
        assert_eq!(local_date(instant, offset), date(2025, 9, 1));
    }

    #[tokio::test]
    async fn test_reminder_sent_to_each_recipient_despite_failure() {
        let svc = LedgerService::new(InMemoryLedgerStore::new(), Vec::new());
        svc.add_loan(NewLoan {
            name: "Car".to_string(),
            monthly_amount: 3_000,
            due_day: 10,
            months_left: 3,
            start_month: date(2025, 8, 1),
            kind: LoanKind::Installment,
            must_start_month: None,
        })
        .await
        .unwrap();

        let notifier = RecordingNotifier {
            reject: Some("blocked".to_string()),
            ..Default::default()
        };
        let recipients = vec![
            Recipient("blocked".to_string()),
            Recipient("chat-1".to_string()),
        ];

        let reminder = send_daily_reminder(&svc, &notifier, &recipients, date(2025, 8, 2))
            .await
            .unwrap();
        assert_eq!(reminder.days_left, 30);
        assert_eq!(reminder.daily_target, 100);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Recipient("chat-1".to_string()));
        assert_eq!(sent[0].1.remaining, 3_000);
    }
}
