//! TOML configuration file I/O
//!
//! Handles loading and saving the relaydeck configuration to/from TOML
//! files in the user's configuration directory.

use crate::config::AppConfig;
use crate::error::{ConfigError, RelaydeckError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the default configuration directory
///
/// Returns ~/.config/relaydeck, or RELAYDECK_CONFIG_DIR if set
pub fn get_config_dir() -> Result<PathBuf, RelaydeckError> {
    // Allow tests to override config directory via environment variable
    if let Ok(config_dir) = std::env::var("RELAYDECK_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var("HOME").map_err(|_| {
        RelaydeckError::Config(ConfigError::IoError {
            message: "HOME environment variable not set".to_string(),
        })
    })?;

    Ok(PathBuf::from(home).join(".config").join("relaydeck"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf, RelaydeckError> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from the default TOML file
pub fn load_config() -> Result<AppConfig, RelaydeckError> {
    let config_path = get_config_path()?;
    load_config_from_path(&config_path)
}

/// Load configuration from a specific TOML file
///
/// A missing file yields the default configuration.
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<AppConfig, RelaydeckError> {
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(
                "No config file at {:?}, using defaults",
                path.as_ref()
            );
            return Ok(AppConfig::default());
        }
        Err(e) => {
            return Err(RelaydeckError::Config(ConfigError::IoError {
                message: format!("Failed to read config file: {}", e),
            }))
        }
    };

    let config: AppConfig = toml::from_str(&contents)?;

    // Validate the loaded configuration
    config
        .validate()
        .map_err(|e| RelaydeckError::Config(ConfigError::ValidationError { message: e }))?;

    debug!(
        debounce_ms = config.connect.debounce_ms,
        custom_dns = config.dns.custom.len(),
        "Loaded configuration"
    );

    Ok(config)
}

/// Save configuration to the default TOML file
pub fn save_config(config: &AppConfig) -> Result<(), RelaydeckError> {
    let config_path = get_config_path()?;
    save_config_to_path(config, &config_path)
}

/// Save configuration to a specific TOML file
pub fn save_config_to_path<P: AsRef<Path>>(
    config: &AppConfig,
    path: P,
) -> Result<(), RelaydeckError> {
    // Validate configuration before saving
    config
        .validate()
        .map_err(|e| RelaydeckError::Config(ConfigError::ValidationError { message: e }))?;

    // Ensure config directory exists
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            RelaydeckError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    let toml_string = toml::to_string_pretty(config)?;

    std::fs::write(&path, toml_string).map_err(|_e| {
        RelaydeckError::Config(ConfigError::SaveFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        })
    })?;

    info!("Saved configuration to {:?}", path.as_ref());
    Ok(())
}
