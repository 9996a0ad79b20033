//! Custom DNS storage
//!
//! The dialog talks to a [`CustomDnsRepository`]. Two implementations are
//! provided: an in-memory one and one persisted in the `[dns]` section of
//! the TOML configuration file.

use crate::config::toml_config::{load_config_from_path, save_config_to_path};
use crate::error::{DnsError, RelaydeckError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info};

/// User DNS preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsSettings {
    /// Whether local network access is allowed while connected
    #[serde(default)]
    pub allow_lan: bool,

    /// Custom DNS servers, in user order
    #[serde(default)]
    pub custom: Vec<IpAddr>,
}

impl DnsSettings {
    /// Whether `address` is already present at an index other than `except`
    pub fn is_duplicate(&self, address: &IpAddr, except: Option<usize>) -> bool {
        self.custom
            .iter()
            .enumerate()
            .any(|(index, entry)| entry == address && Some(index) != except)
    }

    fn add(&mut self, address: IpAddr) {
        self.custom.push(address);
    }

    fn set(&mut self, index: usize, address: IpAddr) -> Result<(), DnsError> {
        let len = self.custom.len();
        let slot = self
            .custom
            .get_mut(index)
            .ok_or(DnsError::IndexOutOfBounds { index, len })?;
        *slot = address;
        Ok(())
    }

    fn delete(&mut self, index: usize) -> Result<IpAddr, DnsError> {
        if index >= self.custom.len() {
            return Err(DnsError::IndexOutOfBounds {
                index,
                len: self.custom.len(),
            });
        }
        Ok(self.custom.remove(index))
    }
}

#[async_trait]
pub trait CustomDnsRepository: Send + Sync {
    fn settings(&self) -> watch::Receiver<DnsSettings>;

    async fn add_custom_dns(&self, address: IpAddr) -> Result<(), DnsError>;

    async fn set_custom_dns(&self, index: usize, address: IpAddr) -> Result<(), DnsError>;

    async fn delete_custom_dns(&self, index: usize) -> Result<(), DnsError>;

    async fn set_allow_lan(&self, allow_lan: bool) -> Result<(), DnsError>;
}

/// Non-persistent repository
#[derive(Debug)]
pub struct MemoryDnsRepository {
    settings: watch::Sender<DnsSettings>,
}

impl MemoryDnsRepository {
    pub fn new(settings: DnsSettings) -> Self {
        let (tx, _rx) = watch::channel(settings);
        Self { settings: tx }
    }

    fn modify(
        &self,
        change: impl FnOnce(&mut DnsSettings) -> Result<(), DnsError>,
    ) -> Result<(), DnsError> {
        let mut result = Ok(());
        self.settings.send_if_modified(|settings| match change(settings) {
            Ok(()) => true,
            Err(e) => {
                result = Err(e);
                false
            }
        });
        result
    }
}

#[async_trait]
impl CustomDnsRepository for MemoryDnsRepository {
    fn settings(&self) -> watch::Receiver<DnsSettings> {
        self.settings.subscribe()
    }

    async fn add_custom_dns(&self, address: IpAddr) -> Result<(), DnsError> {
        self.modify(|settings| {
            settings.add(address);
            Ok(())
        })
    }

    async fn set_custom_dns(&self, index: usize, address: IpAddr) -> Result<(), DnsError> {
        self.modify(|settings| settings.set(index, address))
    }

    async fn delete_custom_dns(&self, index: usize) -> Result<(), DnsError> {
        self.modify(|settings| settings.delete(index).map(|_| ()))
    }

    async fn set_allow_lan(&self, allow_lan: bool) -> Result<(), DnsError> {
        self.modify(|settings| {
            settings.allow_lan = allow_lan;
            Ok(())
        })
    }
}

/// Repository persisted in the application config file
///
/// Every change rewrites the whole file; the rest of the configuration is
/// preserved.
#[derive(Debug)]
pub struct TomlDnsRepository {
    path: PathBuf,
    settings: watch::Sender<DnsSettings>,
}

impl TomlDnsRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RelaydeckError> {
        let config = load_config_from_path(&path)?;
        debug!(entries = config.dns.custom.len(), "Opened custom DNS store");
        let (tx, _rx) = watch::channel(config.dns);
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            settings: tx,
        })
    }

    fn persist(
        &self,
        change: impl FnOnce(&mut DnsSettings) -> Result<(), DnsError>,
    ) -> Result<(), DnsError> {
        let mut config = load_config_from_path(&self.path).map_err(storage_error)?;
        config.dns = self.settings.borrow().clone();
        change(&mut config.dns)?;
        save_config_to_path(&config, &self.path).map_err(storage_error)?;

        info!(entries = config.dns.custom.len(), "Custom DNS settings saved");
        self.settings.send_replace(config.dns);
        Ok(())
    }
}

fn storage_error(error: RelaydeckError) -> DnsError {
    DnsError::Storage {
        message: error.to_string(),
    }
}

#[async_trait]
impl CustomDnsRepository for TomlDnsRepository {
    fn settings(&self) -> watch::Receiver<DnsSettings> {
        self.settings.subscribe()
    }

    async fn add_custom_dns(&self, address: IpAddr) -> Result<(), DnsError> {
        self.persist(|settings| {
            settings.add(address);
            Ok(())
        })
    }

    async fn set_custom_dns(&self, index: usize, address: IpAddr) -> Result<(), DnsError> {
        self.persist(|settings| settings.set(index, address))
    }

    async fn delete_custom_dns(&self, index: usize) -> Result<(), DnsError> {
        self.persist(|settings| settings.delete(index).map(|_| ()))
    }

    async fn set_allow_lan(&self, allow_lan: bool) -> Result<(), DnsError> {
        self.persist(|settings| {
            settings.allow_lan = allow_lan;
            Ok(())
        })
    }
}
