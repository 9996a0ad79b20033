//! Custom DNS commands
//!
//! Each command opens the DNS entry dialog against the configuration file,
//! feeds it the address from the command line, and saves or removes the
//! entry the way the dialog would.

use crate::cli::render;
use colored::Colorize;
use relaydeck_core::config::toml_config::get_config_path;
use relaydeck_core::dns::{
    CustomDnsRepository, DnsDialogResult, DnsDialogViewModel, DnsValidationError,
    TomlDnsRepository,
};
use relaydeck_core::error::{DnsError, RelaydeckError};
use std::sync::Arc;
use tracing::info;

fn open_repository() -> Result<Arc<TomlDnsRepository>, RelaydeckError> {
    let path = get_config_path()?;
    Ok(Arc::new(TomlDnsRepository::open(path)?))
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, RelaydeckError> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    Ok(runtime.block_on(future))
}

fn check_index(repository: &TomlDnsRepository, index: usize) -> Result<String, RelaydeckError> {
    let settings = repository.settings();
    let settings = settings.borrow();
    settings
        .custom
        .get(index)
        .map(|address| address.to_string())
        .ok_or_else(|| {
            DnsError::IndexOutOfBounds {
                index,
                len: settings.custom.len(),
            }
            .into()
        })
}

/// Run the dialog's save path for `address`
fn save(mut dialog: DnsDialogViewModel, address: &str) -> Result<(), RelaydeckError> {
    dialog.on_dns_input_change(address);
    let state = dialog.view_state();

    if !state.is_save_enabled() {
        return Err(DnsError::InvalidAddress {
            input: address.to_string(),
        }
        .into());
    }
    if state.validation_error == Some(DnsValidationError::DuplicateAddress) {
        println!("{} {} is already in the list", "!".yellow(), address.trim());
    }
    if state.show_local_warning() {
        println!(
            "{} {} is a local address and is only reachable with local network sharing enabled",
            "!".yellow(),
            address.trim()
        );
    }

    match block_on(dialog.on_save_dns_click())? {
        DnsDialogResult::Success => {
            println!("{} Saved {}", "✓".green(), address.trim());
            Ok(())
        }
        DnsDialogResult::Error | DnsDialogResult::Cancel => Err(DnsError::Storage {
            message: format!("could not save {}", address.trim()),
        }
        .into()),
    }
}

pub fn run_dns_list() -> Result<(), RelaydeckError> {
    let repository = open_repository()?;
    let settings = repository.settings().borrow().clone();
    println!("{}", render::dns_list(&settings));
    Ok(())
}

#[tracing::instrument]
pub fn run_dns_add(address: &str) -> Result<(), RelaydeckError> {
    let repository = open_repository()?;
    let dialog = DnsDialogViewModel::new(repository, None, None);
    save(dialog, address)
}

#[tracing::instrument]
pub fn run_dns_edit(index: usize, address: &str) -> Result<(), RelaydeckError> {
    let repository = open_repository()?;
    let current = check_index(&repository, index)?;
    let dialog = DnsDialogViewModel::new(repository, Some(current), Some(index));
    save(dialog, address)
}

#[tracing::instrument]
pub fn run_dns_remove(index: usize) -> Result<(), RelaydeckError> {
    let repository = open_repository()?;
    let current = check_index(&repository, index)?;
    let dialog = DnsDialogViewModel::new(repository, Some(current.clone()), Some(index));

    match block_on(dialog.on_remove_dns_click())? {
        DnsDialogResult::Success => {
            println!("{} Removed {}", "✓".green(), current);
            Ok(())
        }
        DnsDialogResult::Error | DnsDialogResult::Cancel => Err(DnsError::Storage {
            message: format!("could not remove {}", current),
        }
        .into()),
    }
}

#[tracing::instrument]
pub fn run_dns_allow_lan(enabled: bool) -> Result<(), RelaydeckError> {
    let repository = open_repository()?;
    block_on(repository.set_allow_lan(enabled))??;
    info!(enabled, "Local network sharing updated");
    println!(
        "{} Local network sharing {}",
        "✓".green(),
        if enabled { "allowed" } else { "blocked" }
    );
    Ok(())
}
