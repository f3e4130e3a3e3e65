//! Config file location, loading and saving.
//!
//! Everything lives under `~/.outreach/`: `config.json` and the default
//! workbook `workbook.sqlite3`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::Config;
use crate::util::{atomic_write_str, expand_home};

const STATE_DIR: &str = ".outreach";

pub fn state_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(STATE_DIR))
}

pub fn config_path() -> Result<PathBuf, String> {
    Ok(state_dir()?.join("config.json"))
}

pub fn default_workbook_path() -> Result<PathBuf, String> {
    Ok(state_dir()?.join("workbook.sqlite3"))
}

/// Load the config from `path`, or from the default location.
///
/// A missing file at the default location yields defaults; a missing file
/// that was asked for explicitly is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, String> {
    let (config_path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (config_path()?, false),
    };

    if !config_path.exists() {
        if explicit {
            return Err(format!("Config file not found at {}", config_path.display()));
        }
        log::info!("No config at {}, using defaults", config_path.display());
        return Ok(Config::default());
    }

    let content =
        fs::read_to_string(&config_path).map_err(|e| format!("Failed to read config: {}", e))?;

    let config: Config =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), String> {
    let (lo, hi) = config.delay_between_requests;
    if lo < 0.0 || hi < 0.0 {
        return Err("delayBetweenRequests must not be negative".to_string());
    }
    let (lo, hi) = config.delay_between_companies;
    if lo < 0.0 || hi < 0.0 {
        return Err("delayBetweenCompanies must not be negative".to_string());
    }
    if config.max_search_results == 0 {
        return Err("maxSearchResults must be at least 1".to_string());
    }
    if config.max_connections_per_company == 0 {
        log::warn!("maxConnectionsPerCompany is 0; no requests will be sent");
    }
    Ok(())
}

pub fn save_config(config: &Config, path: &Path) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    atomic_write_str(path, &content)
}

/// Workbook location: command line, then config, then the default.
pub fn resolve_workbook_path(
    cli_override: Option<&Path>,
    config: &Config,
) -> Result<PathBuf, String> {
    if let Some(path) = cli_override {
        return Ok(path.to_path_buf());
    }
    match config.workbook_path.as_deref() {
        Some(path) if !path.trim().is_empty() => Ok(expand_home(path.trim())),
        _ => default_workbook_path(),
    }
}
