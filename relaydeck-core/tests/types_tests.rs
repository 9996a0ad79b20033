//! Unit tests for type definitions and wrappers
//!
//! Tests serialized forms of tunnel, device and location types, and the
//! secure auth token wrapper.

use relaydeck_core::location::{RelayItem, RelayItemSelection};
use relaydeck_core::tunnel::{ActionAfterDisconnect, ErrorStateCause, TunnelState};
use relaydeck_core::types::{DeviceState, TransportProtocol, VersionInfo, WebsiteAuthToken};

#[derive(serde::Deserialize)]
struct Wrapper<T> {
    value: T,
}

fn from_toml<T: serde::de::DeserializeOwned>(value: &str) -> T {
    toml::from_str::<Wrapper<T>>(&format!("value = {}", value))
        .expect("valid TOML")
        .value
}

#[test]
fn test_tunnel_state_default() {
    let state = TunnelState::default();
    assert_eq!(state, TunnelState::Disconnected { location: None });
    assert!(state.is_disconnected());
    assert!(!state.is_blocking());
}

#[test]
fn test_tunnel_state_from_toml() {
    let state: TunnelState = from_toml(
        r#"{ state = "connected", endpoint = { endpoint = { address = "185.65.135.2:51820", protocol = "udp" }, obfuscation = { address = "185.65.135.9:443", protocol = "tcp" } } }"#,
    );

    let endpoint = state.endpoint().expect("connected has an endpoint");
    assert_eq!(endpoint.in_endpoint().protocol, TransportProtocol::Tcp);
    assert_eq!(endpoint.in_address(), "185.65.135.9:443 TCP");
    assert!(state.is_connected());
}

#[test]
fn test_disconnecting_from_toml() {
    let state: TunnelState =
        from_toml(r#"{ state = "disconnecting", action_after_disconnect = "reconnect" }"#);
    assert_eq!(
        state,
        TunnelState::Disconnecting {
            action_after_disconnect: ActionAfterDisconnect::Reconnect
        }
    );
}

#[test]
fn test_error_state_from_toml() {
    let state: TunnelState = from_toml(
        r#"{ state = "error", error_state = { cause = { cause = "auth_failed", reason = "EXPIRED_ACCOUNT" }, is_blocking = true } }"#,
    );

    match &state {
        TunnelState::Error { error_state } => {
            assert!(error_state.is_expired_account());
            assert!(matches!(error_state.cause, ErrorStateCause::AuthFailed { .. }));
        }
        other => panic!("Expected Error state, got {:?}", other),
    }
    assert!(state.is_blocking());
}

#[test]
fn test_device_state_from_toml() {
    let state: DeviceState = from_toml(
        r#"{ state = "logged_in", account = "1234123412341234", device = { id = "d1", name = "brave red panda" } }"#,
    );
    assert_eq!(state.display_name().as_deref(), Some("Brave Red Panda"));

    let revoked: DeviceState = from_toml(r#"{ state = "revoked" }"#);
    assert!(revoked.is_revoked());
    assert_eq!(revoked.display_name(), None);
}

#[test]
fn test_relay_selection_from_toml() {
    let selection: RelayItemSelection = from_toml(
        r#"{ exit = { kind = "location", country = "Sweden", city = "Malmö" }, entry = { kind = "custom_list", name = "Home" } }"#,
    );
    assert!(matches!(selection.exit, RelayItem::Location(_)));
    assert_eq!(selection.exit.title(), "Malmö");
    assert_eq!(selection.entry.as_ref().map(RelayItem::title), Some("Home"));
}

#[test]
fn test_version_info_defaults_to_supported() {
    let version: VersionInfo = from_toml(r#"{ current = "2024.1" }"#);
    assert!(version.is_supported);
    assert!(VersionInfo::default().is_supported);
}

#[test]
fn test_website_auth_token_is_redacted() {
    let token = WebsiteAuthToken::new("very-secret-token".to_string());
    assert_eq!(token.expose(), "very-secret-token");
    assert!(!format!("{:?}", token).contains("very-secret-token"));
    assert_eq!(token, WebsiteAuthToken::from("very-secret-token".to_string()));
}
