//! Config command handlers

use std::path::{Path, PathBuf};

use crate::cli::error::CliError;
use crate::config::{CONFIG_DIR, CONFIG_FILENAME, SyncConfig, sample_config};

/// Arguments for the config init command
#[derive(Debug, Clone)]
pub struct ConfigInitArgs {
    pub path: Option<PathBuf>,
    pub force: bool,
}

/// Load the sync config from an explicit path or the default location.
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig, CliError> {
    match path {
        Some(path) => Ok(SyncConfig::load(path)?),
        None => Ok(SyncConfig::load_default()?),
    }
}

/// Handle the config init command: write a starter configuration file.
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), CliError> {
    let path = args
        .path
        .clone()
        .unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILENAME));
    if path.exists() && !args.force {
        return Err(CliError::InvalidArgument(format!(
            "Config file exists: {}. Use --force to overwrite.",
            path.display()
        )));
    }
    sample_config().save(&path)?;
    println!("✅ Wrote starter config to {}", path.display());
    Ok(())
}

/// Handle the config show command: print the effective configuration with
/// environment overrides applied. The API key is redacted.
pub fn handle_config_show(config_path: Option<&Path>) -> Result<(), CliError> {
    let mut config = load_config(config_path)?;
    if !config.api.api_key.is_empty() {
        config.api.api_key = "***".to_string();
    }
    let rendered =
        serde_json::to_string_pretty(&config).map_err(|e| CliError::IoError(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}
