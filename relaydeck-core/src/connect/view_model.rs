//! Connect screen view model
//!
//! Aggregates the screen's sources into a debounced [`ConnectUiState`] and
//! turns user actions into requests on the collaborators. Results that the
//! UI has to react to once (permission prompts, errors, navigation) go out
//! on the side effect channel.

use crate::config::ConnectConfig;
use crate::connect::debounce::Debouncer;
use crate::connect::effects::{watch_out_of_time, watch_revoked_device};
use crate::connect::side_effect::{
    AccountPageLink, ConnectErrorEffect, SideEffectSender, UiSideEffect,
};
use crate::connect::ui_state::{derive_ui_state, ConnectInputs, ConnectUiState};
use crate::error::{ConfigError, ConnectError, RelaydeckError};
use crate::notification::InAppNotification;
use crate::repository::{
    AccountRepository, ConnectionProxy, DeviceRepository, PaymentUseCase, PurchaseVerification,
    VpnPermissionRepository,
};
use crate::scope::ViewModelScope;
use crate::tunnel::TunnelState;
use crate::types::{AccountData, DeviceState, GeoIpLocation};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use url::Url;

/// The six observable sources folded into the UI state
#[derive(Debug, Clone)]
pub struct ConnectSources {
    pub selected_relay_item_title: watch::Receiver<Option<String>>,
    pub notifications: watch::Receiver<Vec<InAppNotification>>,
    pub tunnel_state: watch::Receiver<TunnelState>,
    pub last_known_location: watch::Receiver<Option<GeoIpLocation>>,
    pub account_data: watch::Receiver<Option<AccountData>>,
    pub device_state: watch::Receiver<DeviceState>,
}

impl ConnectSources {
    /// Mark every current value as seen and return a copy of them all
    fn snapshot(&mut self) -> ConnectInputs {
        ConnectInputs {
            selected_relay_item_title: self.selected_relay_item_title.borrow_and_update().clone(),
            notifications: self.notifications.borrow_and_update().clone(),
            tunnel_state: self.tunnel_state.borrow_and_update().clone(),
            last_known_location: self.last_known_location.borrow_and_update().clone(),
            account_data: self.account_data.borrow_and_update().clone(),
            device_state: self.device_state.borrow_and_update().clone(),
        }
    }

    /// Resolves when any source changes; `false` once all of them closed
    async fn changed(&mut self) -> bool {
        tokio::select! {
            Ok(()) = self.selected_relay_item_title.changed() => true,
            Ok(()) = self.notifications.changed() => true,
            Ok(()) = self.tunnel_state.changed() => true,
            Ok(()) = self.last_known_location.changed() => true,
            Ok(()) = self.account_data.changed() => true,
            Ok(()) = self.device_state.changed() => true,
            else => false,
        }
    }
}

/// Services the connect screen sends requests to
#[derive(Clone)]
pub struct ConnectCollaborators {
    pub connection_proxy: Arc<dyn ConnectionProxy>,
    pub account_repository: Arc<dyn AccountRepository>,
    pub device_repository: Arc<dyn DeviceRepository>,
    pub payment_use_case: Arc<dyn PaymentUseCase>,
    pub vpn_permission_repository: Arc<dyn VpnPermissionRepository>,
}

pub struct ConnectViewModel {
    sources: ConnectSources,
    collaborators: ConnectCollaborators,
    debounce: Duration,
    is_play_build: bool,
    account_url: Url,
    ui_state: watch::Sender<ConnectUiState>,
    side_effects: SideEffectSender,
    scope: ViewModelScope,
    started: AtomicBool,
}

impl ConnectViewModel {
    /// Create the view model; nothing runs until [`Self::start`]
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the account URL is invalid
    pub fn new(
        sources: ConnectSources,
        collaborators: ConnectCollaborators,
        config: &ConnectConfig,
    ) -> Result<Self, RelaydeckError> {
        let account_url = Url::parse(&config.account_url).map_err(|e| {
            RelaydeckError::Config(ConfigError::ValidationError {
                message: format!("Invalid account_url: {}", e),
            })
        })?;
        let (ui_state, _) = watch::channel(ConnectUiState::INITIAL);

        Ok(Self {
            sources,
            collaborators,
            debounce: config.debounce(),
            is_play_build: config.is_play_build,
            account_url,
            ui_state,
            side_effects: SideEffectSender::new(),
            scope: ViewModelScope::new(),
            started: AtomicBool::new(false),
        })
    }

    /// Latest UI state; starts out as [`ConnectUiState::INITIAL`]
    pub fn ui_state(&self) -> watch::Receiver<ConnectUiState> {
        self.ui_state.subscribe()
    }

    /// Observe side effects sent from now on
    ///
    /// Each effect reaches one observer only: the oldest one still alive.
    pub fn side_effects(&self) -> mpsc::Receiver<UiSideEffect> {
        self.side_effects.subscribe()
    }

    /// Start aggregating sources and watching for effect transitions
    ///
    /// Subscribe to [`Self::side_effects`] first to see effects that are
    /// already due at start. Calling this again has no effect.
    #[tracing::instrument(skip(self))]
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Connect view model already started");
            return;
        }
        info!(debounce = ?self.debounce, "Starting connect view model");

        self.scope.launch(aggregate(
            self.sources.clone(),
            self.ui_state.clone(),
            self.debounce,
            self.is_play_build,
        ));

        self.scope.launch(watch_out_of_time(
            self.sources.account_data.clone(),
            self.sources.tunnel_state.clone(),
            self.side_effects.clone(),
        ));

        self.scope.launch(watch_revoked_device(
            self.sources.device_state.clone(),
            self.side_effects.clone(),
        ));

        let payment = self.collaborators.payment_use_case.clone();
        let account = self.collaborators.account_repository.clone();
        self.scope.launch(async move {
            match payment.verify_purchases().await {
                Ok(PurchaseVerification::Verified) => {
                    info!("Pending purchases verified, refreshing account data");
                    account.refresh_account_data().await;
                }
                Ok(PurchaseVerification::NothingToVerify) => {
                    debug!("No pending purchases");
                }
                Err(e) => warn!("Purchase verification failed: {}", e),
            }
        });
    }

    fn emit(side_effects: &SideEffectSender, effect: UiSideEffect) {
        debug!(?effect, "Sending side effect");
        side_effects.send(effect);
    }

    #[tracing::instrument(skip(self))]
    pub fn on_connect_click(&self) {
        let proxy = self.collaborators.connection_proxy.clone();
        let side_effects = self.side_effects.clone();
        self.scope.launch(async move {
            match proxy.connect().await {
                Ok(()) => debug!("Connect requested"),
                Err(ConnectError::NoVpnPermission) => {
                    info!("VPN permission missing, asking the user");
                    Self::emit(&side_effects, UiSideEffect::NoVpnPermission);
                }
                Err(ConnectError::Unknown { reason }) => {
                    error!("Connect failed: {}", reason);
                    Self::emit(
                        &side_effects,
                        UiSideEffect::ConnectError(ConnectErrorEffect::Generic),
                    );
                }
            }
        });
    }

    /// Result of the OS VPN permission prompt
    #[tracing::instrument(skip(self))]
    pub fn request_vpn_permission_result(&self, granted: bool) {
        if granted {
            self.on_connect_click();
            return;
        }

        let permission = self.collaborators.vpn_permission_repository.clone();
        let side_effects = self.side_effects.clone();
        self.scope.launch(async move {
            let effect = match permission.always_on_vpn_app_name().await {
                Some(app_name) => {
                    warn!(%app_name, "Permission denied while another app is always-on VPN");
                    ConnectErrorEffect::AlwaysOnVpn { app_name }
                }
                None => ConnectErrorEffect::PermissionDenied,
            };
            Self::emit(&side_effects, UiSideEffect::ConnectError(effect));
        });
    }

    #[tracing::instrument(skip(self))]
    pub fn on_disconnect_click(&self) {
        let proxy = self.collaborators.connection_proxy.clone();
        self.scope.launch(async move {
            if let Err(e) = proxy.disconnect().await {
                warn!("Disconnect failed: {}", e);
            }
        });
    }

    #[tracing::instrument(skip(self))]
    pub fn on_reconnect_click(&self) {
        let proxy = self.collaborators.connection_proxy.clone();
        self.scope.launch(async move {
            if let Err(e) = proxy.reconnect().await {
                warn!("Reconnect failed: {}", e);
            }
        });
    }

    /// Abort a pending connection attempt
    pub fn on_cancel_click(&self) {
        self.on_disconnect_click();
    }

    #[tracing::instrument(skip(self))]
    pub fn on_manage_account_click(&self) {
        let account = self.collaborators.account_repository.clone();
        let side_effects = self.side_effects.clone();
        let base = self.account_url.clone();
        self.scope.launch(async move {
            let token = account.website_auth_token().await;
            if token.is_none() {
                warn!("No website auth token, opening account page without login");
            }
            Self::emit(
                &side_effects,
                UiSideEffect::OpenAccountManagementPageInBrowser(AccountPageLink::new(base, token)),
            );
        });
    }

    pub fn on_dismiss_new_device_notification(&self) {
        let device = self.collaborators.device_repository.clone();
        self.scope.launch(async move {
            device.clear_new_device_notification().await;
        });
    }

    /// Cancel every running task; the screen is gone
    pub fn close(&self) {
        info!("Closing connect view model");
        self.scope.cancel();
    }
}

impl Drop for ConnectViewModel {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

/// Recompute on every source change and publish after the debounce window
async fn aggregate(
    mut sources: ConnectSources,
    ui_state: watch::Sender<ConnectUiState>,
    window: Duration,
    is_play_build: bool,
) {
    let mut debouncer = Debouncer::new(window);
    let inputs = sources.snapshot();
    debouncer.push(derive_ui_state(&inputs, is_play_build, Utc::now()));

    loop {
        tokio::select! {
            changed = sources.changed() => {
                if !changed {
                    debug!("All connect sources closed");
                    break;
                }
                let inputs = sources.snapshot();
                debouncer.push(derive_ui_state(&inputs, is_play_build, Utc::now()));
            }
            state = debouncer.ready() => {
                debug!(tunnel_state = %state.tunnel_state, "Publishing connect UI state");
                ui_state.send_replace(state);
            }
        }
    }

    // Flush what the sources last said before going quiet
    if debouncer.is_pending() {
        let state = debouncer.ready().await;
        ui_state.send_replace(state);
    }
}
