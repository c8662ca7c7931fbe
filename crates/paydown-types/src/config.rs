//! Configuration types for Paydown.
//!
//! `PaydownConfig` represents `config.toml` in the data directory. Every
//! field has a default so an empty or missing file is a valid configuration.

use chrono::{FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::loan::NewLoan;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaydownConfig {
    /// Offset of the local time zone all "today" values are taken in.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,

    /// First month of the built-in starter plan.
    #[serde(default = "default_plan_start")]
    pub plan_start: NaiveDate,

    /// Local wall-clock time of the daily reminder (`HH:MM`).
    #[serde(default = "default_reminder_time")]
    pub reminder_time: String,

    /// Opaque recipient handles the daily reminder is sent to.
    #[serde(default)]
    pub recipients: Vec<String>,

    /// Endpoint receiving reminder POSTs. Reminders are only logged when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Replaces the built-in starter plan when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loans: Option<Vec<NewLoan>>,
}

fn default_utc_offset() -> String {
    "+07:00".to_string()
}

fn default_plan_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).unwrap_or_default()
}

fn default_reminder_time() -> String {
    "05:00".to_string()
}

impl Default for PaydownConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
            plan_start: default_plan_start(),
            reminder_time: default_reminder_time(),
            recipients: Vec::new(),
            webhook_url: None,
            loans: None,
        }
    }
}

impl PaydownConfig {
    /// Parse `utc_offset` (e.g. `+07:00`).
    pub fn offset(&self) -> Result<FixedOffset, String> {
        self.utc_offset
            .parse::<FixedOffset>()
            .map_err(|e| format!("invalid utc_offset '{}': {e}", self.utc_offset))
    }

    /// Parse `reminder_time` (e.g. `05:00`).
    pub fn reminder_at(&self) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(self.reminder_time.trim(), "%H:%M")
            .map_err(|e| format!("invalid reminder_time '{}': {e}", self.reminder_time))
    }
}
