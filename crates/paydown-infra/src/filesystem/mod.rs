//! Data directory layout for Paydown.
//!
//! Everything lives in one directory: `config.toml` and `paydown.db`.

use std::path::{Path, PathBuf};

use paydown_types::config::PaydownConfig;

/// Name of the config file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolve the data directory.
///
/// Priority:
/// 1. `PAYDOWN_DATA_DIR` environment variable
/// 2. `~/.paydown`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PAYDOWN_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".paydown");
    }

    // Last resort: current directory
    PathBuf::from(".paydown")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Write a `config.toml` holding the default settings unless one exists.
///
/// Returns `true` when a file was written.
pub async fn write_default_config(data_dir: &Path) -> Result<bool, std::io::Error> {
    let path = config_path(data_dir);
    if tokio::fs::try_exists(&path).await? {
        return Ok(false);
    }

    tokio::fs::create_dir_all(data_dir).await?;
    let content = toml::to_string_pretty(&PaydownConfig::default())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    tokio::fs::write(&path, content).await?;
    tracing::info!(path = %path.display(), "wrote default config");
    Ok(true)
}
