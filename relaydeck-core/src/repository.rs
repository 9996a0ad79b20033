//! Collaborators consumed by the view models
//!
//! Each trait is one external service the connect screen talks to. State
//! is exposed as `watch` receivers so consumers always see the latest
//! value; one-off requests are async methods.

use crate::error::{ConnectError, PaymentError};
use crate::location::RelayItemSelection;
use crate::tunnel::TunnelState;
use crate::types::{AccountData, DeviceState, VersionInfo, WebsiteAuthToken};
use async_trait::async_trait;
use tokio::sync::watch;

/// Controls the tunnel owned by the VPN daemon
#[async_trait]
pub trait ConnectionProxy: Send + Sync {
    fn tunnel_state(&self) -> watch::Receiver<TunnelState>;

    async fn connect(&self) -> Result<(), ConnectError>;

    async fn disconnect(&self) -> Result<(), ConnectError>;

    async fn reconnect(&self) -> Result<(), ConnectError>;
}

/// Account session and its data
#[async_trait]
pub trait AccountRepository: Send + Sync {
    fn account_data(&self) -> watch::Receiver<Option<AccountData>>;

    /// Fetch fresh account data and publish it on [`Self::account_data`]
    async fn refresh_account_data(&self);

    async fn website_auth_token(&self) -> Option<WebsiteAuthToken>;
}

/// Device registration state
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    fn device_state(&self) -> watch::Receiver<DeviceState>;

    /// Name of a device created during this session, until dismissed
    fn new_device_notification(&self) -> watch::Receiver<Option<String>>;

    async fn clear_new_device_notification(&self);
}

/// Outcome of verifying pending in-app purchases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseVerification {
    NothingToVerify,
    Verified,
}

/// Store purchase verification
#[async_trait]
pub trait PaymentUseCase: Send + Sync {
    async fn verify_purchases(&self) -> Result<PurchaseVerification, PaymentError>;
}

/// OS-level VPN permission
#[async_trait]
pub trait VpnPermissionRepository: Send + Sync {
    /// Name of the app configured as always-on VPN, if it isn't us
    async fn always_on_vpn_app_name(&self) -> Option<String>;
}

/// Relay the user picked in the location list
pub trait RelayListRepository: Send + Sync {
    fn relay_selection(&self) -> watch::Receiver<Option<RelayItemSelection>>;
}

/// Version of the running app as reported by the daemon
pub trait AppVersionRepository: Send + Sync {
    fn version_info(&self) -> watch::Receiver<VersionInfo>;
}
