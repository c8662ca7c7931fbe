//! Reminder daemon: sends the daily reminder at the configured local time.

use std::sync::Arc;

use anyhow::Result;
use console::style;

use paydown_core::reminder::scheduler::{ReminderScheduler, reminder_callback};
use paydown_core::reminder::{Recipient, local_date, send_daily_reminder};
use paydown_infra::config::resolve_reminder_time;
use paydown_infra::notify::ConfiguredNotifier;

use crate::state::AppState;

/// Run the scheduler until Ctrl+C, or send one reminder when `once` is set.
pub async fn run(state: &AppState, once: bool, json: bool) -> Result<()> {
    let notifier = Arc::new(ConfiguredNotifier::from_config(&state.config)?);
    let recipients: Arc<Vec<Recipient>> = Arc::new(
        state
            .config
            .recipients
            .iter()
            .cloned()
            .map(Recipient)
            .collect(),
    );

    if recipients.is_empty() {
        tracing::warn!("no recipients configured, reminders will only update the ledger");
    }

    if once {
        let reminder =
            send_daily_reminder(&*state.ledger, notifier.as_ref(), &recipients[..], state.today())
                .await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&reminder)?);
        } else {
            println!(
                "  {} Reminder for {} sent to {} recipient{}",
                style("✓").green().bold(),
                reminder.date,
                recipients.len(),
                if recipients.len() == 1 { "" } else { "s" }
            );
        }
        return Ok(());
    }

    let at = resolve_reminder_time(&state.config);
    let offset = state.offset;
    let ledger = state.ledger.clone();

    let callback = {
        let notifier = notifier.clone();
        let recipients = recipients.clone();
        reminder_callback(move |now| {
            let ledger = ledger.clone();
            let notifier = notifier.clone();
            let recipients = recipients.clone();
            async move {
                let today = local_date(now, offset);
                if let Err(e) =
                    send_daily_reminder(&*ledger, notifier.as_ref(), &recipients[..], today).await
                {
                    tracing::error!(%today, error = %e, "daily reminder failed");
                }
            }
        })
    };

    let scheduler = ReminderScheduler::new();
    scheduler.start().await?;
    scheduler.schedule_daily(at, offset, callback).await?;

    if !json {
        println!(
            "  {} Daily reminder at {} ({}) via {}",
            style("⏰").bold(),
            style(at.format("%H:%M")).cyan(),
            offset,
            notifier.kind()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }

    crate::shutdown_signal().await;
    scheduler.stop().await?;

    if !json {
        println!("\n  Reminder stopped.");
    }
    Ok(())
}
