//! Core library for the relaydeck VPN client screens
//!
//! This crate provides the connect screen state holder, the custom DNS
//! entry dialog, and the collaborator traits they are driven through.

pub mod error;
pub mod types;

pub mod backend;
pub mod config;
pub mod connect;
pub mod dns;
pub mod location;
pub mod notification;
pub mod repository;
pub mod scope;
pub mod tunnel;

/// Initialize logging infrastructure
///
/// Logs to the systemd journal when running under systemd, otherwise to
/// stderr with pretty formatting.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    #[cfg(target_os = "linux")]
    {
        if std::env::var("JOURNAL_STREAM").is_ok() {
            let journal_layer = tracing_journald::layer()?;
            tracing_subscriber::registry()
                .with(journal_layer)
                .with(tracing_subscriber::filter::LevelFilter::INFO)
                .init();
            return Ok(());
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    Ok(())
}
