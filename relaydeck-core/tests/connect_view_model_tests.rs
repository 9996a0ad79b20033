//! Integration tests for the connect screen view model
//!
//! Drives the view model through the in-memory backend with tokio's clock
//! paused, so debounce windows and expiry timers run instantly.

use chrono::{Duration as ChronoDuration, Utc};
use relaydeck_core::backend::{ConnectScreen, MemoryBackend, ProxyCall};
use relaydeck_core::config::ConnectConfig;
use relaydeck_core::connect::{ConnectErrorEffect, ConnectUiState, UiSideEffect};
use relaydeck_core::location::{RelayItem, RelayItemSelection, RelayLocation};
use relaydeck_core::notification::InAppNotification;
use relaydeck_core::tunnel::{
    ActionAfterDisconnect, ErrorState, ErrorStateCause, TunnelState, EXPIRED_ACCOUNT_REASON,
};
use relaydeck_core::types::{
    AccountData, AccountId, Device, DeviceState, Endpoint, GeoIpLocation, TransportProtocol,
    TunnelEndpoint,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};

fn wire(backend: &Arc<MemoryBackend>) -> ConnectScreen {
    ConnectScreen::wire(backend.clone(), &ConnectConfig::default()).expect("default config is valid")
}

fn endpoint() -> TunnelEndpoint {
    TunnelEndpoint::new(Endpoint::new(
        "185.65.135.2:51820".parse().unwrap(),
        TransportProtocol::Udp,
    ))
}

fn home() -> GeoIpLocation {
    let mut location = GeoIpLocation::new("Sweden");
    location.city = Some("Gothenburg".to_string());
    location.ipv4 = Some("203.0.113.7".parse().unwrap());
    location
}

fn connected() -> TunnelState {
    let mut location = GeoIpLocation::new("Germany");
    location.ipv4 = Some("198.51.100.20".parse().unwrap());
    TunnelState::Connected {
        endpoint: endpoint(),
        location: Some(location),
    }
}

// Give spawned tasks a chance to run
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

async fn next_state(ui: &mut watch::Receiver<ConnectUiState>) -> ConnectUiState {
    ui.changed().await.expect("view model alive");
    ui.borrow_and_update().clone()
}

async fn next_effect(effects: &mut mpsc::Receiver<UiSideEffect>) -> UiSideEffect {
    tokio::time::timeout(Duration::from_secs(1), effects.recv())
        .await
        .expect("effect within a second")
        .expect("effect channel open")
}

#[tokio::test(start_paused = true)]
async fn test_initial_state_is_published_after_debounce() {
    // Given: A disconnected backend with a known home location
    let backend = Arc::new(MemoryBackend::new());
    backend.set_tunnel_state(TunnelState::Disconnected {
        location: Some(home()),
    });
    let screen = wire(&backend);
    let mut ui = screen.view_model.ui_state();
    assert_eq!(*ui.borrow(), ConnectUiState::INITIAL);

    // When: The view model starts
    let started = tokio::time::Instant::now();
    screen.view_model.start();
    let state = next_state(&mut ui).await;

    // Then: The first state lands one debounce window later
    assert_eq!(started.elapsed(), Duration::from_millis(200));
    assert!(state.show_location);
    assert_eq!(state.location, Some(home()));
    assert_eq!(state.out_address, "203.0.113.7");
    assert_eq!(state.in_address, None);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_emits_once_with_last_value() {
    let backend = Arc::new(MemoryBackend::new());
    let screen = wire(&backend);
    let mut ui = screen.view_model.ui_state();
    screen.view_model.start();
    next_state(&mut ui).await;

    // When: Several sources change within one debounce window
    backend.set_tunnel_state(TunnelState::Connecting {
        endpoint: Some(endpoint()),
        location: None,
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    backend.set_device_state(DeviceState::LoggedIn {
        account: AccountId("1234".to_string()),
        device: Device::new("d1", "happy otter"),
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    backend.set_tunnel_state(connected());

    // Then: Exactly one state is emitted, equal to the last computed one
    let state = next_state(&mut ui).await;
    assert_eq!(state.tunnel_state, connected());
    assert_eq!(state.device_name.as_deref(), Some("Happy Otter"));
    assert_eq!(state.in_address.as_deref(), Some("185.65.135.2:51820 UDP"));
    assert_eq!(state.out_address, "198.51.100.20");
    assert!(!state.show_location);

    let more = tokio::time::timeout(Duration::from_secs(1), ui.changed()).await;
    assert!(more.is_err(), "burst must not produce a second emission");
}

#[tokio::test(start_paused = true)]
async fn test_location_follows_tunnel_phase() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_tunnel_state(TunnelState::Disconnected {
        location: Some(home()),
    });
    let screen = wire(&backend);
    let mut ui = screen.view_model.ui_state();
    screen.view_model.start();
    next_state(&mut ui).await;

    // Blocking disconnect: last known location is shown
    backend.set_tunnel_state(TunnelState::Disconnecting {
        action_after_disconnect: ActionAfterDisconnect::Block,
    });
    let state = next_state(&mut ui).await;
    assert!(state.show_location);
    assert_eq!(state.location, Some(home()));

    // Reconnecting: location hidden
    backend.set_tunnel_state(TunnelState::Disconnecting {
        action_after_disconnect: ActionAfterDisconnect::Reconnect,
    });
    let state = next_state(&mut ui).await;
    assert!(!state.show_location);

    // Connecting without a location: nothing to show, not even the last known
    backend.set_tunnel_state(TunnelState::Connecting {
        endpoint: None,
        location: None,
    });
    let state = next_state(&mut ui).await;
    assert!(!state.show_location);
    assert_eq!(state.location, None);

    // Error: shown
    backend.set_tunnel_state(TunnelState::Error {
        error_state: ErrorState::new(ErrorStateCause::IsOffline, true),
    });
    let state = next_state(&mut ui).await;
    assert!(state.show_location);
    assert!(matches!(
        state.in_app_notification,
        Some(InAppNotification::TunnelStateError { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_selection_title_and_account_days() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_account_data(Some(AccountData::new(
        "1234",
        Utc::now() + ChronoDuration::days(10) + ChronoDuration::hours(1),
    )));
    let screen = wire(&backend);
    let mut ui = screen.view_model.ui_state();
    screen.view_model.start();
    next_state(&mut ui).await;

    backend.set_relay_selection(Some(RelayItemSelection {
        exit: RelayItem::Location(RelayLocation {
            country: "Germany".to_string(),
            city: Some("Berlin".to_string()),
            hostname: None,
        }),
        entry: Some(RelayItem::CustomList {
            name: "Fast".to_string(),
        }),
    }));
    let state = next_state(&mut ui).await;

    assert_eq!(
        state.selected_relay_item_title.as_deref(),
        Some("Berlin via Fast")
    );
    assert_eq!(state.days_left_until_expiry, Some(10));
    assert!(!state.is_play_build);
}

#[tokio::test(start_paused = true)]
async fn test_side_effects_are_not_replayed() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_vpn_permission(false);
    let screen = wire(&backend);
    let mut early = screen.view_model.side_effects();
    screen.view_model.start();

    // When: Connect is clicked without VPN permission
    screen.view_model.on_connect_click();

    // Then: The live subscriber gets one permission request
    assert_eq!(next_effect(&mut early).await, UiSideEffect::NoVpnPermission);
    settle().await;
    assert_eq!(early.try_recv(), Err(TryRecvError::Empty));

    // And: A late subscriber sees nothing
    let mut late = screen.view_model.side_effects();
    settle().await;
    assert_eq!(late.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn test_side_effect_reaches_a_single_observer() {
    // Given: Two observers of the same screen
    let backend = Arc::new(MemoryBackend::new());
    backend.set_vpn_permission(false);
    let screen = wire(&backend);
    let mut first = screen.view_model.side_effects();
    let mut second = screen.view_model.side_effects();
    screen.view_model.start();

    // When: Connect is clicked without VPN permission
    screen.view_model.on_connect_click();

    // Then: Only one of them is asked for permission
    assert_eq!(next_effect(&mut first).await, UiSideEffect::NoVpnPermission);
    settle().await;
    assert_eq!(second.try_recv(), Err(TryRecvError::Empty));

    // And: With the first observer gone, the next effect goes to the other
    drop(first);
    screen.view_model.on_connect_click();
    assert_eq!(next_effect(&mut second).await, UiSideEffect::NoVpnPermission);
}

#[tokio::test(start_paused = true)]
async fn test_permission_granted_connects() {
    let backend = Arc::new(MemoryBackend::new());
    let screen = wire(&backend);
    let mut ui = screen.view_model.ui_state();
    screen.view_model.start();
    next_state(&mut ui).await;

    screen.view_model.request_vpn_permission_result(true);
    let state = next_state(&mut ui).await;

    assert_eq!(backend.proxy_calls(), vec![ProxyCall::Connect]);
    assert!(matches!(state.tunnel_state, TunnelState::Connecting { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_reports_always_on_app() {
    let backend = Arc::new(MemoryBackend::new());
    let screen = wire(&backend);
    let mut effects = screen.view_model.side_effects();
    screen.view_model.start();

    screen.view_model.request_vpn_permission_result(false);
    assert_eq!(
        next_effect(&mut effects).await,
        UiSideEffect::ConnectError(ConnectErrorEffect::PermissionDenied)
    );

    backend.set_always_on_app(Some("OtherVPN".to_string()));
    screen.view_model.request_vpn_permission_result(false);
    assert_eq!(
        next_effect(&mut effects).await,
        UiSideEffect::ConnectError(ConnectErrorEffect::AlwaysOnVpn {
            app_name: "OtherVPN".to_string()
        })
    );
    assert!(backend.proxy_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_connect_failure_is_generic_error() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_connect_failure(Some("daemon unreachable".to_string()));
    let screen = wire(&backend);
    let mut effects = screen.view_model.side_effects();
    screen.view_model.start();

    screen.view_model.on_connect_click();

    assert_eq!(
        next_effect(&mut effects).await,
        UiSideEffect::ConnectError(ConnectErrorEffect::Generic)
    );
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_reconnect_and_cancel_reach_proxy() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_tunnel_state(connected());
    let screen = wire(&backend);
    screen.view_model.start();

    screen.view_model.on_reconnect_click();
    settle().await;
    screen.view_model.on_cancel_click();
    settle().await;

    assert_eq!(
        backend.proxy_calls(),
        vec![ProxyCall::Reconnect, ProxyCall::Disconnect]
    );
}

#[tokio::test(start_paused = true)]
async fn test_manage_account_opens_page_with_token() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_auth_token(Some("tok123".to_string()));
    let screen = wire(&backend);
    let mut effects = screen.view_model.side_effects();
    screen.view_model.start();

    screen.view_model.on_manage_account_click();

    match next_effect(&mut effects).await {
        UiSideEffect::OpenAccountManagementPageInBrowser(link) => {
            assert!(link.has_token());
            assert_eq!(
                link.to_url().as_str(),
                "https://relaydeck.net/account?token=tok123"
            );
        }
        other => panic!("unexpected effect: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_revoked_device_fires_on_each_transition() {
    let backend = Arc::new(MemoryBackend::new());
    let screen = wire(&backend);
    let mut effects = screen.view_model.side_effects();
    screen.view_model.start();
    settle().await;

    backend.set_device_state(DeviceState::Revoked);
    assert_eq!(next_effect(&mut effects).await, UiSideEffect::RevokedDevice);

    // Same state again is not a new transition
    backend.set_device_state(DeviceState::Revoked);
    settle().await;
    assert_eq!(effects.try_recv(), Err(TryRecvError::Empty));

    backend.set_device_state(DeviceState::LoggedOut);
    settle().await;
    backend.set_device_state(DeviceState::Revoked);
    assert_eq!(next_effect(&mut effects).await, UiSideEffect::RevokedDevice);
}

#[tokio::test(start_paused = true)]
async fn test_expired_account_at_start_is_out_of_time() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_account_data(Some(AccountData::new(
        "1234",
        Utc::now() - ChronoDuration::days(1),
    )));
    let screen = wire(&backend);
    let mut effects = screen.view_model.side_effects();

    screen.view_model.start();

    assert_eq!(next_effect(&mut effects).await, UiSideEffect::OutOfTime);
    settle().await;
    assert_eq!(effects.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn test_account_running_out_while_open() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_account_data(Some(AccountData::new(
        "1234",
        Utc::now() + ChronoDuration::seconds(30),
    )));
    let screen = wire(&backend);
    let mut effects = screen.view_model.side_effects();
    screen.view_model.start();
    settle().await;
    assert_eq!(effects.try_recv(), Err(TryRecvError::Empty));

    // When: The expiry moment passes
    let effect = tokio::time::timeout(Duration::from_secs(60), effects.recv())
        .await
        .expect("expiry timer fires")
        .expect("effect channel open");

    // Then: Out of time is reported
    assert_eq!(effect, UiSideEffect::OutOfTime);
}

#[tokio::test(start_paused = true)]
async fn test_expiry_warning_appears_while_open() {
    // Given: Just over three days left, outside the default warning window
    let backend = Arc::new(MemoryBackend::new());
    let expiry = Utc::now() + ChronoDuration::days(3) + ChronoDuration::seconds(20);
    backend.set_account_data(Some(AccountData::new("1234", expiry)));
    let screen = wire(&backend);
    let mut ui = screen.view_model.ui_state();
    screen.view_model.start();
    assert_eq!(next_state(&mut ui).await.in_app_notification, None);

    // When: The warning window opens with no source changing
    let state = tokio::time::timeout(Duration::from_secs(60), next_state(&mut ui))
        .await
        .expect("warning timer fires");

    // Then: The screen shows the expiry notification
    assert_eq!(
        state.in_app_notification,
        Some(InAppNotification::AccountExpiry { expiry })
    );
}

#[tokio::test(start_paused = true)]
async fn test_expired_account_tunnel_error_is_out_of_time() {
    let backend = Arc::new(MemoryBackend::new());
    let screen = wire(&backend);
    let mut effects = screen.view_model.side_effects();
    screen.view_model.start();
    settle().await;

    backend.set_tunnel_state(TunnelState::Error {
        error_state: ErrorState::new(
            ErrorStateCause::AuthFailed {
                reason: Some(EXPIRED_ACCOUNT_REASON.to_string()),
            },
            true,
        ),
    });

    assert_eq!(next_effect(&mut effects).await, UiSideEffect::OutOfTime);
}

#[tokio::test(start_paused = true)]
async fn test_verified_purchase_refreshes_account() {
    let backend = Arc::new(MemoryBackend::new());
    let expiry = Utc::now() + ChronoDuration::days(2);
    backend.set_account_data(Some(AccountData::new("1234", expiry)));
    backend.set_pending_purchase(Some(30));
    let screen = wire(&backend);
    let mut ui = screen.view_model.ui_state();

    screen.view_model.start();
    let state = next_state(&mut ui).await;

    assert_eq!(state.days_left_until_expiry, Some(31));
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_new_device_notification() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_new_device(Some("Happy Otter".to_string()));
    let screen = wire(&backend);
    let mut ui = screen.view_model.ui_state();
    screen.view_model.start();

    let state = next_state(&mut ui).await;
    assert_eq!(
        state.in_app_notification,
        Some(InAppNotification::NewDevice {
            device_name: "Happy Otter".to_string()
        })
    );

    screen.view_model.on_dismiss_new_device_notification();
    let state = next_state(&mut ui).await;
    assert_eq!(state.in_app_notification, None);
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_is_harmless() {
    let backend = Arc::new(MemoryBackend::new());
    let screen = wire(&backend);
    let mut ui = screen.view_model.ui_state();

    screen.view_model.start();
    screen.view_model.start();
    next_state(&mut ui).await;

    let more = tokio::time::timeout(Duration::from_secs(1), ui.changed()).await;
    assert!(more.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_updates_and_actions() {
    let backend = Arc::new(MemoryBackend::new());
    let screen = wire(&backend);
    let mut ui = screen.view_model.ui_state();
    screen.view_model.start();
    next_state(&mut ui).await;

    // When: The screen is closed
    screen.close();

    // Then: Source changes are no longer published
    backend.set_tunnel_state(connected());
    let more = tokio::time::timeout(Duration::from_secs(1), ui.changed()).await;
    assert!(!matches!(more, Ok(Ok(()))));

    // And: Actions are not forwarded
    screen.view_model.on_connect_click();
    settle().await;
    assert!(backend.proxy_calls().is_empty());
}
