//! In-memory backend
//!
//! Implements every connect screen collaborator on top of `watch`
//! channels. Used by the `play` command to drive the screen from a script
//! and by tests. State changes happen only through the setters or the
//! collaborator calls.

use crate::error::{ConnectError, PaymentError};
use crate::location::RelayItemSelection;
use crate::repository::{
    AccountRepository, AppVersionRepository, ConnectionProxy, DeviceRepository, PaymentUseCase,
    PurchaseVerification, RelayListRepository, VpnPermissionRepository,
};
use crate::tunnel::{ActionAfterDisconnect, TunnelState};
use crate::types::{AccountData, DeviceState, GeoIpLocation, VersionInfo, WebsiteAuthToken};
use async_trait::async_trait;
use chrono::Duration;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info};

/// Requests the connection proxy has received, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyCall {
    Connect,
    Disconnect,
    Reconnect,
}

#[derive(Debug, Default)]
struct Settings {
    vpn_permission_granted: bool,
    always_on_app: Option<String>,
    connect_failure: Option<String>,
    auth_token: Option<String>,
    pending_purchase_days: Option<u32>,
    verified_days: u32,
    purchase_provider_down: bool,
    home_location: Option<GeoIpLocation>,
}

#[derive(Debug)]
pub struct MemoryBackend {
    tunnel_state: watch::Sender<TunnelState>,
    account_data: watch::Sender<Option<AccountData>>,
    device_state: watch::Sender<DeviceState>,
    new_device: watch::Sender<Option<String>>,
    version_info: watch::Sender<VersionInfo>,
    relay_selection: watch::Sender<Option<RelayItemSelection>>,
    settings: Mutex<Settings>,
    calls: Mutex<Vec<ProxyCall>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Disconnected, logged out, VPN permission granted
    pub fn new() -> Self {
        Self {
            tunnel_state: watch::channel(TunnelState::default()).0,
            account_data: watch::channel(None).0,
            device_state: watch::channel(DeviceState::default()).0,
            new_device: watch::channel(None).0,
            version_info: watch::channel(VersionInfo::default()).0,
            relay_selection: watch::channel(None).0,
            settings: Mutex::new(Settings {
                vpn_permission_granted: true,
                ..Default::default()
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn settings(&self) -> MutexGuard<'_, Settings> {
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_tunnel_state(&self, state: TunnelState) {
        debug!(%state, "Tunnel state set");
        if let TunnelState::Disconnected {
            location: Some(location),
        } = &state
        {
            self.settings().home_location = Some(location.clone());
        }
        self.tunnel_state.send_replace(state);
    }

    pub fn set_account_data(&self, account: Option<AccountData>) {
        self.account_data.send_replace(account);
    }

    pub fn set_device_state(&self, state: DeviceState) {
        self.device_state.send_replace(state);
    }

    pub fn set_new_device(&self, name: Option<String>) {
        self.new_device.send_replace(name);
    }

    pub fn set_version_info(&self, version: VersionInfo) {
        self.version_info.send_replace(version);
    }

    pub fn set_relay_selection(&self, selection: Option<RelayItemSelection>) {
        self.relay_selection.send_replace(selection);
    }

    pub fn set_vpn_permission(&self, granted: bool) {
        self.settings().vpn_permission_granted = granted;
    }

    pub fn set_always_on_app(&self, app_name: Option<String>) {
        self.settings().always_on_app = app_name;
    }

    /// Make the next connect requests fail with `reason`
    pub fn set_connect_failure(&self, reason: Option<String>) {
        self.settings().connect_failure = reason;
    }

    pub fn set_auth_token(&self, token: Option<String>) {
        self.settings().auth_token = token;
    }

    /// Queue a purchase of `days` to be found by purchase verification
    pub fn set_pending_purchase(&self, days: Option<u32>) {
        self.settings().pending_purchase_days = days;
    }

    pub fn set_purchase_provider_down(&self, down: bool) {
        self.settings().purchase_provider_down = down;
    }

    pub fn proxy_calls(&self) -> Vec<ProxyCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, call: ProxyCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }
}

impl RelayListRepository for MemoryBackend {
    fn relay_selection(&self) -> watch::Receiver<Option<RelayItemSelection>> {
        self.relay_selection.subscribe()
    }
}

impl AppVersionRepository for MemoryBackend {
    fn version_info(&self) -> watch::Receiver<VersionInfo> {
        self.version_info.subscribe()
    }
}

#[async_trait]
impl ConnectionProxy for MemoryBackend {
    fn tunnel_state(&self) -> watch::Receiver<TunnelState> {
        self.tunnel_state.subscribe()
    }

    async fn connect(&self) -> Result<(), ConnectError> {
        self.record(ProxyCall::Connect);
        {
            let settings = self.settings();
            if !settings.vpn_permission_granted {
                return Err(ConnectError::NoVpnPermission);
            }
            if let Some(reason) = &settings.connect_failure {
                return Err(ConnectError::Unknown {
                    reason: reason.clone(),
                });
            }
        }

        if !self.tunnel_state.borrow().is_connected() {
            self.set_tunnel_state(TunnelState::Connecting {
                endpoint: None,
                location: None,
            });
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ConnectError> {
        self.record(ProxyCall::Disconnect);
        let location = self.settings().home_location.clone();
        self.set_tunnel_state(TunnelState::Disconnected { location });
        Ok(())
    }

    async fn reconnect(&self) -> Result<(), ConnectError> {
        self.record(ProxyCall::Reconnect);
        if self.tunnel_state.borrow().is_disconnected() {
            return Ok(());
        }
        self.set_tunnel_state(TunnelState::Disconnecting {
            action_after_disconnect: ActionAfterDisconnect::Reconnect,
        });
        self.set_tunnel_state(TunnelState::Connecting {
            endpoint: None,
            location: None,
        });
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for MemoryBackend {
    fn account_data(&self) -> watch::Receiver<Option<AccountData>> {
        self.account_data.subscribe()
    }

    async fn refresh_account_data(&self) {
        let days = std::mem::take(&mut self.settings().verified_days);
        if days == 0 {
            return;
        }
        self.account_data.send_modify(|account| {
            if let Some(account) = account {
                account.expiry += Duration::days(i64::from(days));
                info!(days, expiry = %account.expiry, "Account time added");
            }
        });
    }

    async fn website_auth_token(&self) -> Option<WebsiteAuthToken> {
        self.settings().auth_token.clone().map(WebsiteAuthToken::new)
    }
}

#[async_trait]
impl DeviceRepository for MemoryBackend {
    fn device_state(&self) -> watch::Receiver<DeviceState> {
        self.device_state.subscribe()
    }

    fn new_device_notification(&self) -> watch::Receiver<Option<String>> {
        self.new_device.subscribe()
    }

    async fn clear_new_device_notification(&self) {
        self.new_device.send_replace(None);
    }
}

#[async_trait]
impl PaymentUseCase for MemoryBackend {
    async fn verify_purchases(&self) -> Result<PurchaseVerification, PaymentError> {
        let mut settings = self.settings();
        if settings.purchase_provider_down {
            return Err(PaymentError::ProviderUnavailable);
        }
        match settings.pending_purchase_days.take() {
            Some(days) => {
                settings.verified_days += days;
                Ok(PurchaseVerification::Verified)
            }
            None => Ok(PurchaseVerification::NothingToVerify),
        }
    }
}

#[async_trait]
impl VpnPermissionRepository for MemoryBackend {
    async fn always_on_vpn_app_name(&self) -> Option<String> {
        self.settings().always_on_app.clone()
    }
}
