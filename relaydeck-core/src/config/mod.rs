//! Configuration module
//!
//! Handles loading and saving relaydeck configuration from TOML files.

use crate::dns::DnsSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod toml_config;

/// Settings for the connect screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// Debounce window for UI state emissions, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Whether this is a store build (affects account management UI)
    #[serde(default)]
    pub is_play_build: bool,

    /// Account management page opened in the browser
    #[serde(default = "default_account_url")]
    pub account_url: String,

    /// Days before expiry at which the expiry notification appears
    #[serde(default = "default_expiry_warning_days")]
    pub expiry_warning_days: u32,
}

fn default_debounce_ms() -> u64 {
    200
}
fn default_account_url() -> String {
    "https://relaydeck.net/account".to_string()
}
fn default_expiry_warning_days() -> u32 {
    3
}

impl ConnectConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Validate the connect settings
    ///
    /// # Returns
    ///
    /// * `Ok(())` if all fields are valid
    /// * `Err(String)` describing the first invalid field
    pub fn validate(&self) -> Result<(), String> {
        if self.debounce_ms < 1 || self.debounce_ms > 5000 {
            return Err(format!(
                "debounce_ms must be between 1 and 5000, got {}",
                self.debounce_ms
            ));
        }

        if self.expiry_warning_days < 1 || self.expiry_warning_days > 30 {
            return Err(format!(
                "expiry_warning_days must be between 1 and 30, got {}",
                self.expiry_warning_days
            ));
        }

        self.validate_account_url()
    }

    /// Validate account_url is a valid HTTP/HTTPS URL
    fn validate_account_url(&self) -> Result<(), String> {
        use url::Url;

        match Url::parse(&self.account_url) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(()),
                scheme => Err(format!(
                    "account_url scheme must be http or https, got: {}",
                    scheme
                )),
            },
            Err(e) => Err(format!("Failed to parse account_url: {}", e)),
        }
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            is_play_build: false,
            account_url: default_account_url(),
            expiry_warning_days: default_expiry_warning_days(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub connect: ConnectConfig,

    #[serde(default)]
    pub dns: DnsSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.connect.validate()
    }
}
