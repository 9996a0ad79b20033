//! Tunnel state as reported by the connection proxy
//!
//! Defines the closed set of tunnel phases and the payload each phase
//! carries for rendering.

use crate::types::{GeoIpLocation, TunnelEndpoint};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Auth failure reason the API reports for accounts without time left
pub const EXPIRED_ACCOUNT_REASON: &str = "EXPIRED_ACCOUNT";

/// What the daemon will do once a disconnect has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionAfterDisconnect {
    Nothing,
    Block,
    Reconnect,
}

/// Why the tunnel entered the error state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum ErrorStateCause {
    AuthFailed {
        #[serde(default)]
        reason: Option<String>,
    },
    Ipv6Unavailable,
    SetFirewallPolicyError,
    SetDnsError,
    StartTunnelError,
    IsOffline,
    /// The OS-level VPN permission is missing
    NoVpnPermission,
    /// Another app is configured as the always-on VPN
    OtherAlwaysOnApp { app_name: String },
    InvalidDnsServers { addresses: Vec<IpAddr> },
}

/// Error payload of [`TunnelState::Error`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorState {
    pub cause: ErrorStateCause,
    /// Whether traffic is still being blocked while in this state
    #[serde(default)]
    pub is_blocking: bool,
}

impl ErrorState {
    pub fn new(cause: ErrorStateCause, is_blocking: bool) -> Self {
        Self { cause, is_blocking }
    }

    pub fn is_expired_account(&self) -> bool {
        matches!(
            &self.cause,
            ErrorStateCause::AuthFailed { reason: Some(reason) } if reason == EXPIRED_ACCOUNT_REASON
        )
    }
}

/// Current phase of the VPN tunnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TunnelState {
    Disconnected {
        #[serde(default)]
        location: Option<GeoIpLocation>,
    },
    Connecting {
        #[serde(default)]
        endpoint: Option<TunnelEndpoint>,
        #[serde(default)]
        location: Option<GeoIpLocation>,
    },
    Connected {
        endpoint: TunnelEndpoint,
        #[serde(default)]
        location: Option<GeoIpLocation>,
    },
    Disconnecting {
        action_after_disconnect: ActionAfterDisconnect,
    },
    Error {
        error_state: ErrorState,
    },
}

impl Default for TunnelState {
    fn default() -> Self {
        Self::Disconnected { location: None }
    }
}

impl std::fmt::Display for TunnelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TunnelState::Disconnected { .. } => write!(f, "disconnected"),
            TunnelState::Connecting { .. } => write!(f, "connecting"),
            TunnelState::Connected { .. } => write!(f, "connected"),
            TunnelState::Disconnecting {
                action_after_disconnect,
            } => match action_after_disconnect {
                ActionAfterDisconnect::Nothing => write!(f, "disconnecting"),
                ActionAfterDisconnect::Block => write!(f, "disconnecting (block)"),
                ActionAfterDisconnect::Reconnect => write!(f, "disconnecting (reconnect)"),
            },
            TunnelState::Error { error_state } if error_state.is_blocking => {
                write!(f, "error (blocking)")
            }
            TunnelState::Error { .. } => write!(f, "error"),
        }
    }
}

impl TunnelState {
    /// Location embedded in the state itself, if the phase carries one
    pub fn location(&self) -> Option<&GeoIpLocation> {
        match self {
            TunnelState::Disconnected { location }
            | TunnelState::Connecting { location, .. }
            | TunnelState::Connected { location, .. } => location.as_ref(),
            TunnelState::Disconnecting { .. } | TunnelState::Error { .. } => None,
        }
    }

    /// Endpoint of a pending or established tunnel
    pub fn endpoint(&self) -> Option<&TunnelEndpoint> {
        match self {
            TunnelState::Connecting { endpoint, .. } => endpoint.as_ref(),
            TunnelState::Connected { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, TunnelState::Disconnected { .. })
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, TunnelState::Connected { .. })
    }

    /// Whether the daemon is blocking all traffic in this state
    pub fn is_blocking(&self) -> bool {
        match self {
            TunnelState::Connecting { .. } => true,
            TunnelState::Disconnecting {
                action_after_disconnect,
            } => *action_after_disconnect == ActionAfterDisconnect::Block,
            TunnelState::Error { error_state } => error_state.is_blocking,
            _ => false,
        }
    }
}
