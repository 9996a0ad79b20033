//! Error types for relaydeck
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use thiserror::Error;

/// Main error type for the relaydeck application
#[derive(Error, Debug)]
pub enum RelaydeckError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors reported by the tunnel connection proxy
    #[error("Connect error: {0}")]
    Connect(#[from] ConnectError),

    /// Errors related to custom DNS storage
    #[error("DNS error: {0}")]
    Dns(#[from] DnsError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Failures of a connect request
///
/// Connect failures never end up in the UI state; the connect screen turns
/// them into one-shot side effects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("VPN permission has not been granted")]
    NoVpnPermission,

    #[error("Connect request failed: {reason}")]
    Unknown { reason: String },
}

/// Custom DNS storage errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("Not a valid DNS server address: {input}")]
    InvalidAddress { input: String },

    #[error("No custom DNS entry at index {index} (have {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Failed to persist custom DNS entries: {message}")]
    Storage { message: String },
}

/// In-app purchase verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment provider unavailable")]
    ProviderUnavailable,

    #[error("Purchase verification failed: {reason}")]
    VerificationFailed { reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RelaydeckError>;
