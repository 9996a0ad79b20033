//! State holder for the custom DNS entry dialog

use crate::dns::address::{is_local_address, parse_dns_address};
use crate::dns::repository::{CustomDnsRepository, DnsSettings};
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Problem found with the current input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsValidationError {
    /// Not an IP address; blocks saving
    InvalidAddress,
    /// Already in the list; shown as a hint only
    DuplicateAddress,
}

/// Outcome handed back to whoever opened the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsDialogResult {
    Success,
    Error,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsDialogViewState {
    pub input: String,
    pub validation_error: Option<DnsValidationError>,
    pub is_local: bool,
    pub is_allow_lan_enabled: bool,
    /// Position of the entry being edited; `None` when adding
    pub index: Option<usize>,
}

impl DnsDialogViewState {
    pub fn is_new_entry(&self) -> bool {
        self.index.is_none()
    }

    /// Only a syntactically invalid address disables saving
    pub fn is_save_enabled(&self) -> bool {
        self.validation_error != Some(DnsValidationError::InvalidAddress)
    }

    pub fn can_remove(&self) -> bool {
        self.index.is_some()
    }

    /// A local address will not be reachable unless LAN access is allowed
    pub fn show_local_warning(&self) -> bool {
        self.is_local && !self.is_allow_lan_enabled
    }
}

/// Compute the view state for `input` against `settings`
pub fn validate_dns_entry(
    input: &str,
    index: Option<usize>,
    settings: &DnsSettings,
) -> DnsDialogViewState {
    let address = parse_dns_address(input);
    let validation_error = match &address {
        None => Some(DnsValidationError::InvalidAddress),
        Some(address) if settings.is_duplicate(address, index) => {
            Some(DnsValidationError::DuplicateAddress)
        }
        Some(_) => None,
    };

    DnsDialogViewState {
        input: input.to_string(),
        validation_error,
        is_local: address.as_ref().is_some_and(is_local_address),
        is_allow_lan_enabled: settings.allow_lan,
        index,
    }
}

pub struct DnsDialogViewModel {
    repository: Arc<dyn CustomDnsRepository>,
    settings: watch::Receiver<DnsSettings>,
    input: String,
    index: Option<usize>,
}

impl DnsDialogViewModel {
    /// Open the dialog, prefilled with `initial_value` when editing `index`
    pub fn new(
        repository: Arc<dyn CustomDnsRepository>,
        initial_value: Option<String>,
        index: Option<usize>,
    ) -> Self {
        let settings = repository.settings();
        Self {
            repository,
            settings,
            input: initial_value.unwrap_or_default(),
            index,
        }
    }

    pub fn on_dns_input_change(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Validation against the latest stored settings
    pub fn view_state(&self) -> DnsDialogViewState {
        validate_dns_entry(&self.input, self.index, &self.settings.borrow())
    }

    #[tracing::instrument(skip(self), fields(index = ?self.index))]
    pub async fn on_save_dns_click(&self) -> DnsDialogResult {
        let state = self.view_state();
        let address = match (state.validation_error, parse_dns_address(&state.input)) {
            (Some(DnsValidationError::InvalidAddress), _) | (_, None) => {
                debug!("Save requested with invalid input");
                return DnsDialogResult::Error;
            }
            (Some(DnsValidationError::DuplicateAddress), Some(address)) => {
                return self.save_duplicate(address).await;
            }
            (None, Some(address)) => address,
        };

        let result = match self.index {
            Some(index) => self.repository.set_custom_dns(index, address).await,
            None => self.repository.add_custom_dns(address).await,
        };

        match result {
            Ok(()) => {
                info!(%address, "Custom DNS entry saved");
                DnsDialogResult::Success
            }
            Err(e) => {
                warn!("Failed to save custom DNS entry: {}", e);
                DnsDialogResult::Error
            }
        }
    }

    /// The address is already listed elsewhere; an edited slot folds into it
    async fn save_duplicate(&self, address: IpAddr) -> DnsDialogResult {
        let Some(index) = self.index else {
            debug!("Address already present, nothing to store");
            return DnsDialogResult::Success;
        };

        match self.repository.delete_custom_dns(index).await {
            Ok(()) => {
                info!(%address, index, "Edited entry merged into existing one");
                DnsDialogResult::Success
            }
            Err(e) => {
                warn!("Failed to merge custom DNS entry: {}", e);
                DnsDialogResult::Error
            }
        }
    }

    #[tracing::instrument(skip(self), fields(index = ?self.index))]
    pub async fn on_remove_dns_click(&self) -> DnsDialogResult {
        let Some(index) = self.index else {
            debug!("Remove requested for a new entry");
            return DnsDialogResult::Error;
        };

        match self.repository.delete_custom_dns(index).await {
            Ok(()) => {
                info!(index, "Custom DNS entry removed");
                DnsDialogResult::Success
            }
            Err(e) => {
                warn!("Failed to remove custom DNS entry: {}", e);
                DnsDialogResult::Error
            }
        }
    }

    pub fn on_dismiss(&self) -> DnsDialogResult {
        DnsDialogResult::Cancel
    }
}
