//! Configuration loader for Paydown.
//!
//! Reads `config.toml` from the data directory (`~/.paydown/` in production)
//! and deserializes it into [`PaydownConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use chrono::{FixedOffset, NaiveTime, Offset, Utc};
use paydown_core::ledger::starter_plan;
use paydown_types::config::PaydownConfig;
use paydown_types::loan::NewLoan;

use crate::filesystem::config_path;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`PaydownConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> PaydownConfig {
    let path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return PaydownConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return PaydownConfig::default();
        }
    };

    match toml::from_str::<PaydownConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            PaydownConfig::default()
        }
    }
}

/// Loans seeded into an empty ledger.
///
/// A `[[loans]]` list in the config replaces the built-in plan entirely.
pub fn resolve_starter_plan(config: &PaydownConfig) -> Vec<NewLoan> {
    match &config.loans {
        Some(loans) => loans.clone(),
        None => starter_plan(config.plan_start),
    }
}

/// The configured UTC offset, or UTC with a warning when it does not parse.
pub fn resolve_offset(config: &PaydownConfig) -> FixedOffset {
    config.offset().unwrap_or_else(|err| {
        tracing::warn!("{err}, using UTC");
        Utc.fix()
    })
}

/// The configured reminder time, or 05:00 with a warning when it does not parse.
pub fn resolve_reminder_time(config: &PaydownConfig) -> NaiveTime {
    config.reminder_at().unwrap_or_else(|err| {
        tracing::warn!("{err}, using 05:00");
        NaiveTime::from_hms_opt(5, 0, 0).unwrap_or_default()
    })
}
