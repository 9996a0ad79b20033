//! Custom DNS entry handling
//!
//! Address validation, the entry dialog state holder, and storage.

pub mod address;
pub mod dialog;
pub mod repository;

// Public re-exports
pub use dialog::{
    validate_dns_entry, DnsDialogResult, DnsDialogViewModel, DnsDialogViewState,
    DnsValidationError,
};
pub use repository::{CustomDnsRepository, DnsSettings, MemoryDnsRepository, TomlDnsRepository};
