//! Backends the connect screen can run against
//!
//! [`ConnectScreen::wire`] builds the derived sources (selected location
//! title, last known location, notifications) inside a scope and hands the
//! view model its inputs. Any [`ConnectBackend`] can be wired; the
//! in-memory one is provided here.

pub mod memory;

use crate::config::ConnectConfig;
use crate::connect::{ConnectCollaborators, ConnectSources, ConnectViewModel};
use crate::error::RelaydeckError;
use crate::location::{LastKnownLocationUseCase, SelectedLocationTitleUseCase};
use crate::notification::{NotificationController, NotificationSources};
use crate::repository::{
    AccountRepository, AppVersionRepository, ConnectionProxy, DeviceRepository, PaymentUseCase,
    RelayListRepository, VpnPermissionRepository,
};
use crate::scope::ViewModelScope;
use std::sync::Arc;

// Public re-exports
pub use memory::{MemoryBackend, ProxyCall};

/// Every service the connect screen needs, provided by one backend
pub trait ConnectBackend:
    ConnectionProxy
    + AccountRepository
    + DeviceRepository
    + PaymentUseCase
    + VpnPermissionRepository
    + RelayListRepository
    + AppVersionRepository
    + 'static
{
}

impl<T> ConnectBackend for T where
    T: ConnectionProxy
        + AccountRepository
        + DeviceRepository
        + PaymentUseCase
        + VpnPermissionRepository
        + RelayListRepository
        + AppVersionRepository
        + 'static
{
}

/// A connect view model together with the tasks feeding it
pub struct ConnectScreen {
    pub view_model: ConnectViewModel,
    use_cases: ViewModelScope,
}

impl ConnectScreen {
    /// Wire a view model to `backend`; call `view_model.start()` next
    ///
    /// # Errors
    ///
    /// Returns an error if the connect configuration is unusable
    pub fn wire<B: ConnectBackend>(
        backend: Arc<B>,
        config: &ConnectConfig,
    ) -> Result<Self, RelaydeckError> {
        let use_cases = ViewModelScope::new();
        let tunnel_state = backend.tunnel_state();
        let account_data = backend.account_data();

        let notifications = NotificationController::new(
            NotificationSources {
                tunnel_state: tunnel_state.clone(),
                account_data: account_data.clone(),
                new_device: backend.new_device_notification(),
                version_info: backend.version_info(),
            },
            config,
        )
        .launch(&use_cases);

        let sources = ConnectSources {
            selected_relay_item_title: SelectedLocationTitleUseCase::launch(
                backend.relay_selection(),
                &use_cases,
            ),
            notifications,
            last_known_location: LastKnownLocationUseCase::launch(
                tunnel_state.clone(),
                &use_cases,
            ),
            tunnel_state,
            account_data,
            device_state: backend.device_state(),
        };

        let collaborators = ConnectCollaborators {
            connection_proxy: backend.clone(),
            account_repository: backend.clone(),
            device_repository: backend.clone(),
            payment_use_case: backend.clone(),
            vpn_permission_repository: backend,
        };

        let view_model = ConnectViewModel::new(sources, collaborators, config)?;
        Ok(Self {
            view_model,
            use_cases,
        })
    }

    /// Stop the view model and the derived sources
    pub fn close(&self) {
        self.view_model.close();
        self.use_cases.cancel();
    }
}

impl Drop for ConnectScreen {
    fn drop(&mut self) {
        self.use_cases.cancel();
    }
}
