//! Configuration and store locations for the CLI.

use crate::error::{CliError, Result};
use revisor_session::RevisorConfig;
use revisor_store::SqliteStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding the default config file and database.
pub fn default_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    Ok(home.join(".revisor"))
}

/// Load configuration from `path`, or from the default location if it
/// exists, or fall back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<RevisorConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_dir()?.join("config.toml");
            if !path.exists() {
                return Ok(RevisorConfig::default());
            }
            path
        }
    };
    Ok(RevisorConfig::from_file(&path)?)
}

/// Open the document database, creating its directory if needed.
pub fn open_store(path: Option<&Path>) -> Result<SqliteStore> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_dir()?.join("revisor.db"),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(SqliteStore::new(&path)?)
}
