//! Terminal rendering of connect screen snapshots and DNS entries

use colored::Colorize;
use relaydeck_core::connect::{ConnectErrorEffect, ConnectUiState, UiSideEffect};
use relaydeck_core::dns::DnsSettings;
use relaydeck_core::dns::address::is_local_address;
use relaydeck_core::notification::{InAppNotification, StatusLevel};
use relaydeck_core::tunnel::TunnelState;
use serde_json::json;
use std::time::Duration;

fn stamp(elapsed: Duration) -> String {
    format!("[+{:>5}ms]", elapsed.as_millis()).dimmed().to_string()
}

fn tunnel_label(state: &TunnelState) -> String {
    let label = state.to_string();
    match state {
        TunnelState::Connected { .. } => label.green().bold().to_string(),
        TunnelState::Connecting { .. } | TunnelState::Disconnecting { .. } => {
            label.yellow().to_string()
        }
        TunnelState::Disconnected { .. } => label.normal().to_string(),
        TunnelState::Error { .. } => label.red().bold().to_string(),
    }
}

fn notification_label(notification: &InAppNotification) -> String {
    let text = match notification {
        InAppNotification::TunnelStateError { error_state } => {
            format!("Tunnel error: {:?}", error_state.cause)
        }
        InAppNotification::TunnelStateBlocked => "Blocking internet".to_string(),
        InAppNotification::UnsupportedVersion { version } => {
            format!("Version {} is no longer supported", version)
        }
        InAppNotification::AccountExpiry { expiry } => {
            format!("Account time runs out {}", expiry.format("%Y-%m-%d %H:%M UTC"))
        }
        InAppNotification::NewDevice { device_name } => {
            format!("New device: {}", device_name)
        }
        InAppNotification::UpdateAvailable { version } => {
            format!("Update available: {}", version)
        }
    };
    match notification.status_level() {
        StatusLevel::Error => text.red().to_string(),
        StatusLevel::Warning => text.yellow().to_string(),
        StatusLevel::Info => text.cyan().to_string(),
    }
}

/// One line per emitted UI state
pub fn state_line(elapsed: Duration, state: &ConnectUiState) -> String {
    let mut parts = vec![format!("{} {}", "state".bold(), tunnel_label(&state.tunnel_state))];

    if let Some(title) = &state.selected_relay_item_title {
        parts.push(format!("relay: {}", title));
    }
    if state.show_location {
        if let Some(location) = &state.location {
            let place = match &location.city {
                Some(city) => format!("{}, {}", city, location.country),
                None => location.country.clone(),
            };
            parts.push(format!("location: {}", place));
        }
    }
    if let Some(in_address) = &state.in_address {
        parts.push(format!("in: {}", in_address));
    }
    if !state.out_address.is_empty() {
        parts.push(format!("out: {}", state.out_address));
    }
    if let Some(device) = &state.device_name {
        parts.push(format!("device: {}", device));
    }
    if let Some(days) = state.days_left_until_expiry {
        parts.push(format!("days left: {}", days));
    }
    if let Some(notification) = &state.in_app_notification {
        parts.push(notification_label(notification));
    }

    format!("{} {}", stamp(elapsed), parts.join(" | "))
}

fn effect_text(effect: &UiSideEffect) -> String {
    match effect {
        UiSideEffect::OpenAccountManagementPageInBrowser(link) => {
            if link.has_token() {
                "open account page (logged in)".to_string()
            } else {
                "open account page".to_string()
            }
        }
        UiSideEffect::OutOfTime => "out of time".to_string(),
        UiSideEffect::RevokedDevice => "device revoked".to_string(),
        UiSideEffect::NoVpnPermission => "request VPN permission".to_string(),
        UiSideEffect::ConnectError(ConnectErrorEffect::Generic) => "connect failed".to_string(),
        UiSideEffect::ConnectError(ConnectErrorEffect::PermissionDenied) => {
            "VPN permission denied".to_string()
        }
        UiSideEffect::ConnectError(ConnectErrorEffect::AlwaysOnVpn { app_name }) => {
            format!("{} is set as always-on VPN", app_name)
        }
    }
}

pub fn effect_line(elapsed: Duration, effect: &UiSideEffect) -> String {
    format!(
        "{} {} {}",
        stamp(elapsed),
        "effect".magenta().bold(),
        effect_text(effect)
    )
}

fn effect_kind(effect: &UiSideEffect) -> &'static str {
    match effect {
        UiSideEffect::OpenAccountManagementPageInBrowser(_) => "open_account_management_page",
        UiSideEffect::OutOfTime => "out_of_time",
        UiSideEffect::RevokedDevice => "revoked_device",
        UiSideEffect::NoVpnPermission => "no_vpn_permission",
        UiSideEffect::ConnectError(_) => "connect_error",
    }
}

/// JSON line for a UI state emission
pub fn state_json(elapsed: Duration, state: &ConnectUiState) -> serde_json::Value {
    json!({
        "type": "state",
        "at_ms": elapsed.as_millis() as u64,
        "state": state,
    })
}

/// JSON line for a side effect; the account link never carries its token
pub fn effect_json(elapsed: Duration, effect: &UiSideEffect) -> serde_json::Value {
    let mut value = json!({
        "type": "effect",
        "at_ms": elapsed.as_millis() as u64,
        "effect": effect_kind(effect),
    });
    match effect {
        UiSideEffect::OpenAccountManagementPageInBrowser(link) => {
            value["with_token"] = json!(link.has_token());
        }
        UiSideEffect::ConnectError(error) => {
            value["error"] = match error {
                ConnectErrorEffect::Generic => json!("generic"),
                ConnectErrorEffect::PermissionDenied => json!("permission_denied"),
                ConnectErrorEffect::AlwaysOnVpn { app_name } => {
                    json!({ "always_on_vpn": app_name })
                }
            };
        }
        _ => {}
    }
    value
}

pub fn dns_list(settings: &DnsSettings) -> String {
    let mut lines = vec![format!(
        "Local network sharing: {}",
        if settings.allow_lan {
            "allowed".green()
        } else {
            "blocked".normal()
        }
    )];

    if settings.custom.is_empty() {
        lines.push("No custom DNS servers".dimmed().to_string());
    }
    for (index, address) in settings.custom.iter().enumerate() {
        let mut line = format!("{:>3}  {}", index, address);
        if is_local_address(address) && !settings.allow_lan {
            line.push_str(&format!("  {}", "(local, needs local network sharing)".yellow()));
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaydeck_core::connect::AccountPageLink;
    use relaydeck_core::types::WebsiteAuthToken;
    use url::Url;

    #[test]
    fn test_effect_json_omits_token() {
        let link = AccountPageLink::new(
            Url::parse("https://relaydeck.net/account").unwrap(),
            Some(WebsiteAuthToken::new("hunter2".into())),
        );
        let value = effect_json(
            Duration::from_millis(5),
            &UiSideEffect::OpenAccountManagementPageInBrowser(link),
        );
        assert_eq!(value["effect"], "open_account_management_page");
        assert_eq!(value["with_token"], true);
        assert!(!value.to_string().contains("hunter2"));
    }

    #[test]
    fn test_dns_list_marks_local_entries() {
        colored::control::set_override(false);
        let settings = DnsSettings {
            allow_lan: false,
            custom: vec!["192.168.1.1".parse().unwrap(), "1.1.1.1".parse().unwrap()],
        };
        let output = dns_list(&settings);
        assert!(output.contains("  0  192.168.1.1  (local"));
        assert!(output.contains("  1  1.1.1.1"));
        assert!(!output.contains("1.1.1.1  (local"));
    }
}
