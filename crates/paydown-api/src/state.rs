//! Application state wiring the ledger service to its SQLite store.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use paydown_core::reminder::local_date;
use paydown_core::service::LedgerService;
use paydown_infra::config::{load_config, resolve_offset, resolve_starter_plan};
use paydown_infra::filesystem::resolve_data_dir;
use paydown_infra::sqlite::ledger::SqliteLedgerStore;
use paydown_infra::sqlite::pool::DatabasePool;
use paydown_types::config::PaydownConfig;

/// The ledger service pinned to the SQLite store.
pub type ConcreteLedgerService = LedgerService<SqliteLedgerStore>;

/// Shared application state used by every command.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<ConcreteLedgerService>,
    pub config: Arc<PaydownConfig>,
    pub offset: FixedOffset,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
    date_override: Option<NaiveDate>,
}

impl AppState {
    /// Load config, open the database, wire the service.
    ///
    /// `date_override` pins "today" for every command (`--date`).
    pub async fn init(date_override: Option<NaiveDate>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_config(&data_dir).await;
        let offset = resolve_offset(&config);

        let db_pool = DatabasePool::open_in(&data_dir).await?;
        let store = SqliteLedgerStore::new(db_pool.clone());
        let ledger = LedgerService::new(store, resolve_starter_plan(&config));

        tracing::debug!(data_dir = %data_dir.display(), %offset, "application state ready");

        Ok(Self {
            ledger: Arc::new(ledger),
            config: Arc::new(config),
            offset,
            data_dir,
            db_pool,
            date_override,
        })
    }

    /// Today's calendar date in the configured time zone.
    pub fn today(&self) -> NaiveDate {
        self.date_override
            .unwrap_or_else(|| local_date(Utc::now(), self.offset))
    }
}
