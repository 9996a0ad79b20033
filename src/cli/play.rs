//! Play back a connect screen script
//!
//! A script is a TOML file with a list of `[[steps]]`. Each step waits
//! `delay_ms`, then updates the in-memory backend and finally performs an
//! optional user action on the screen. Every UI state emission and side
//! effect is printed as it happens.
//!
//! ```toml
//! [[steps]]
//! tunnel = { state = "disconnected", location = { country = "Sweden" } }
//! account = { days = 2 }
//!
//! [[steps]]
//! delay_ms = 500
//! action = "connect"
//! ```

use crate::cli::render;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use relaydeck_core::backend::{ConnectScreen, MemoryBackend};
use relaydeck_core::config::toml_config::load_config;
use relaydeck_core::config::AppConfig;
use relaydeck_core::connect::{ConnectUiState, ConnectViewModel, UiSideEffect};
use relaydeck_core::error::{ConfigError, RelaydeckError};
use relaydeck_core::location::RelayItemSelection;
use relaydeck_core::tunnel::TunnelState;
use relaydeck_core::types::{AccountData, DeviceState, VersionInfo};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Extra wait after the last step so the final debounced state lands
const SETTLE_MARGIN: Duration = Duration::from_millis(50);

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    #[serde(default)]
    pub delay_ms: u64,
    pub tunnel: Option<TunnelState>,
    pub selection: Option<RelayItemSelection>,
    pub account: Option<AccountStep>,
    pub device: Option<DeviceState>,
    pub new_device: Option<String>,
    pub version: Option<VersionInfo>,
    pub vpn_permission: Option<bool>,
    pub always_on_app: Option<String>,
    pub connect_failure: Option<String>,
    pub auth_token: Option<String>,
    pub pending_purchase_days: Option<u32>,
    pub action: Option<Action>,
}

/// Account whose expiry is relative to the moment the step runs
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountStep {
    #[serde(default = "default_account_id")]
    pub id: String,
    #[serde(default)]
    pub days: i64,
    #[serde(default)]
    pub seconds: i64,
}

fn default_account_id() -> String {
    "1234567890123456".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Connect,
    Disconnect,
    Reconnect,
    Cancel,
    ManageAccount,
    PermissionGranted,
    PermissionDenied,
    DismissNewDevice,
}

/// Parse a script from TOML text
pub fn parse_script(contents: &str) -> Result<Script, RelaydeckError> {
    Ok(toml::from_str(contents)?)
}

/// Run the play command
pub fn run_play(script_path: &Path, json: bool) -> Result<(), RelaydeckError> {
    let config = load_config()?;
    let contents = std::fs::read_to_string(script_path)?;
    let script = parse_script(&contents)?;
    info!(steps = script.steps.len(), "Loaded connect script");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(play(script, config, json))
}

impl AccountStep {
    /// Expiry `days` and `seconds` from `now`
    fn expiry(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, RelaydeckError> {
        ChronoDuration::try_days(self.days)
            .zip(ChronoDuration::try_seconds(self.seconds))
            .and_then(|(days, seconds)| days.checked_add(&seconds))
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or_else(|| {
                ConfigError::ValidationError {
                    message: format!(
                        "Account expiry out of range: days = {}, seconds = {}",
                        self.days, self.seconds
                    ),
                }
                .into()
            })
    }
}

fn apply(
    backend: &MemoryBackend,
    view_model: &ConnectViewModel,
    step: Step,
) -> Result<(), RelaydeckError> {
    if let Some(tunnel) = step.tunnel {
        backend.set_tunnel_state(tunnel);
    }
    if let Some(selection) = step.selection {
        backend.set_relay_selection(Some(selection));
    }
    if let Some(account) = step.account {
        let expiry = account.expiry(Utc::now())?;
        backend.set_account_data(Some(AccountData::new(account.id, expiry)));
    }
    if let Some(device) = step.device {
        backend.set_device_state(device);
    }
    if let Some(name) = step.new_device {
        backend.set_new_device(Some(name));
    }
    if let Some(version) = step.version {
        backend.set_version_info(version);
    }
    if let Some(granted) = step.vpn_permission {
        backend.set_vpn_permission(granted);
    }
    if let Some(app_name) = step.always_on_app {
        backend.set_always_on_app(Some(app_name));
    }
    if let Some(reason) = step.connect_failure {
        backend.set_connect_failure(Some(reason));
    }
    if let Some(token) = step.auth_token {
        backend.set_auth_token(Some(token));
    }
    if let Some(days) = step.pending_purchase_days {
        backend.set_pending_purchase(Some(days));
    }

    if let Some(action) = step.action {
        debug!(?action, "Performing action");
        match action {
            Action::Connect => view_model.on_connect_click(),
            Action::Disconnect => view_model.on_disconnect_click(),
            Action::Reconnect => view_model.on_reconnect_click(),
            Action::Cancel => view_model.on_cancel_click(),
            Action::ManageAccount => view_model.on_manage_account_click(),
            Action::PermissionGranted => view_model.request_vpn_permission_result(true),
            Action::PermissionDenied => view_model.request_vpn_permission_result(false),
            Action::DismissNewDevice => view_model.on_dismiss_new_device_notification(),
        }
    }
    Ok(())
}

fn print_state(started: Instant, state: &ConnectUiState, json: bool) {
    if json {
        println!("{}", render::state_json(started.elapsed(), state));
    } else {
        println!("{}", render::state_line(started.elapsed(), state));
    }
}

fn print_effect(started: Instant, effect: &UiSideEffect, json: bool) {
    if json {
        println!("{}", render::effect_json(started.elapsed(), effect));
    } else {
        println!("{}", render::effect_line(started.elapsed(), effect));
    }
}

async fn play(script: Script, config: AppConfig, json: bool) -> Result<(), RelaydeckError> {
    let backend = Arc::new(MemoryBackend::new());
    let screen = ConnectScreen::wire(backend.clone(), &config.connect)?;

    let mut ui_state = screen.view_model.ui_state();
    let mut effects = screen.view_model.side_effects();
    screen.view_model.start();
    let started = Instant::now();

    let printer = tokio::spawn(async move {
        let mut state_open = true;
        let mut effects_open = true;
        while state_open || effects_open {
            tokio::select! {
                changed = ui_state.changed(), if state_open => match changed {
                    Ok(()) => {
                        let state = ui_state.borrow_and_update().clone();
                        print_state(started, &state, json);
                    }
                    Err(_) => state_open = false,
                },
                effect = effects.recv(), if effects_open => match effect {
                    Some(effect) => print_effect(started, &effect, json),
                    None => effects_open = false,
                },
            }
        }
    });

    let outcome = run_steps(&backend, &screen.view_model, script.steps).await;
    if outcome.is_ok() {
        tokio::time::sleep(config.connect.debounce() + SETTLE_MARGIN).await;
    }
    screen.close();
    drop(screen);

    if let Err(e) = printer.await {
        warn!("Output task failed: {}", e);
    }
    outcome
}

async fn run_steps(
    backend: &MemoryBackend,
    view_model: &ConnectViewModel,
    steps: Vec<Step>,
) -> Result<(), RelaydeckError> {
    for step in steps {
        if step.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
        }
        apply(backend, view_model, step)?;
        tokio::task::yield_now().await;
    }
    Ok(())
}
