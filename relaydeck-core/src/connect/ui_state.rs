//! Connect screen UI state and the rules deriving it

use crate::notification::InAppNotification;
use crate::tunnel::{ActionAfterDisconnect, TunnelState};
use crate::types::{AccountData, DeviceState, GeoIpLocation};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot rendered by the connect screen
///
/// Never mutated in place; every emission replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectUiState {
    pub location: Option<GeoIpLocation>,
    pub selected_relay_item_title: Option<String>,
    pub tunnel_state: TunnelState,
    pub in_address: Option<String>,
    pub out_address: String,
    pub show_location: bool,
    pub in_app_notification: Option<InAppNotification>,
    pub device_name: Option<String>,
    pub days_left_until_expiry: Option<i64>,
    pub is_play_build: bool,
}

impl ConnectUiState {
    /// State shown before the first emission
    pub const INITIAL: ConnectUiState = ConnectUiState {
        location: None,
        selected_relay_item_title: None,
        tunnel_state: TunnelState::Disconnected { location: None },
        in_address: None,
        out_address: String::new(),
        show_location: false,
        in_app_notification: None,
        device_name: None,
        days_left_until_expiry: None,
        is_play_build: false,
    };
}

impl Default for ConnectUiState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Latest value of every source the connect screen observes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectInputs {
    pub selected_relay_item_title: Option<String>,
    pub notifications: Vec<InAppNotification>,
    pub tunnel_state: TunnelState,
    pub last_known_location: Option<GeoIpLocation>,
    pub account_data: Option<AccountData>,
    pub device_state: DeviceState,
}

/// Whether the location should be shown for `state`
pub fn show_location(state: &TunnelState) -> bool {
    match state {
        TunnelState::Disconnected { .. } => true,
        TunnelState::Connecting { .. } => false,
        TunnelState::Connected { .. } => false,
        TunnelState::Disconnecting {
            action_after_disconnect,
        } => match action_after_disconnect {
            ActionAfterDisconnect::Nothing => false,
            ActionAfterDisconnect::Block => true,
            ActionAfterDisconnect::Reconnect => false,
        },
        TunnelState::Error { .. } => true,
    }
}

/// Location to render: the tunnel's own, or the last known one while
/// disconnected or disconnecting
pub fn resolve_location(
    state: &TunnelState,
    last_known: Option<&GeoIpLocation>,
) -> Option<GeoIpLocation> {
    match state.location() {
        Some(location) => Some(location.clone()),
        None => match state {
            TunnelState::Disconnected { .. } | TunnelState::Disconnecting { .. } => {
                last_known.cloned()
            }
            _ => None,
        },
    }
}

/// Fold all inputs into a fresh UI state
pub fn derive_ui_state(
    inputs: &ConnectInputs,
    is_play_build: bool,
    now: DateTime<Utc>,
) -> ConnectUiState {
    let tunnel_state = &inputs.tunnel_state;

    let in_address = match tunnel_state {
        TunnelState::Connecting { .. } | TunnelState::Connected { .. } => {
            tunnel_state.endpoint().map(|endpoint| endpoint.in_address())
        }
        _ => None,
    };

    ConnectUiState {
        location: resolve_location(tunnel_state, inputs.last_known_location.as_ref()),
        selected_relay_item_title: inputs.selected_relay_item_title.clone(),
        tunnel_state: tunnel_state.clone(),
        in_address,
        out_address: tunnel_state
            .location()
            .and_then(GeoIpLocation::out_address)
            .unwrap_or_default(),
        show_location: show_location(tunnel_state),
        in_app_notification: inputs.notifications.first().cloned(),
        device_name: inputs.device_state.display_name(),
        days_left_until_expiry: inputs
            .account_data
            .as_ref()
            .map(|account| account.days_left(now)),
        is_play_build,
    }
}
