//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the rollcall data folder
pub const DATA_DIR_ENV: &str = "ROLLCALL_DATA_DIR";

/// Resolve the data folder in priority order:
/// 1. Command-line argument (highest priority)
/// 2. `ROLLCALL_DATA_DIR` environment variable
/// 3. `data_dir` key in the platform config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Ok(config_path) = config_file_path() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&content) {
                if let Some(dir) = config.get("data_dir").and_then(|v| v.as_str()) {
                    return PathBuf::from(dir);
                }
            }
        }
    }

    default_data_dir()
}

/// Ensure the data folder exists, creating it if missing.
pub fn ensure_data_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Default sqlite database path inside a data folder
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("rollcall.db")
}

/// Default override-table path inside a data folder
pub fn overrides_path(data_dir: &Path) -> PathBuf {
    data_dir.join("overrides.toml")
}

fn config_file_path() -> Result<PathBuf> {
    let path = dirs::config_dir()
        .map(|d| d.join("rollcall").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rollcall"))
        .unwrap_or_else(|| PathBuf::from("./rollcall_data"))
}
