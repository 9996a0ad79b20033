//! In-app notifications shown on top of the connect screen
//!
//! `NotificationController` folds tunnel, account, device and version
//! state into one ordered list. The connect screen shows the first entry.

use crate::config::ConnectConfig;
use crate::scope::ViewModelScope;
use crate::tunnel::{ErrorState, TunnelState};
use crate::types::{AccountData, VersionInfo};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

/// How prominently a notification is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

/// Severity used for colouring, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InAppNotification {
    TunnelStateError { error_state: ErrorState },
    TunnelStateBlocked,
    UnsupportedVersion { version: String },
    AccountExpiry { expiry: DateTime<Utc> },
    NewDevice { device_name: String },
    UpdateAvailable { version: String },
}

impl InAppNotification {
    pub fn priority(&self) -> NotificationPriority {
        match self {
            InAppNotification::TunnelStateError { .. }
            | InAppNotification::TunnelStateBlocked
            | InAppNotification::UnsupportedVersion { .. } => NotificationPriority::High,
            InAppNotification::AccountExpiry { .. } | InAppNotification::NewDevice { .. } => {
                NotificationPriority::Medium
            }
            InAppNotification::UpdateAvailable { .. } => NotificationPriority::Low,
        }
    }

    pub fn status_level(&self) -> StatusLevel {
        match self {
            InAppNotification::TunnelStateError { .. }
            | InAppNotification::TunnelStateBlocked
            | InAppNotification::UnsupportedVersion { .. } => StatusLevel::Error,
            InAppNotification::AccountExpiry { .. } => StatusLevel::Warning,
            InAppNotification::NewDevice { .. } | InAppNotification::UpdateAvailable { .. } => {
                StatusLevel::Info
            }
        }
    }
}

/// Notification derived from the tunnel state alone
pub fn tunnel_state_notification(state: &TunnelState) -> Option<InAppNotification> {
    match state {
        TunnelState::Error { error_state } => Some(InAppNotification::TunnelStateError {
            error_state: error_state.clone(),
        }),
        TunnelState::Connecting { .. } | TunnelState::Disconnecting { .. }
            if state.is_blocking() =>
        {
            Some(InAppNotification::TunnelStateBlocked)
        }
        _ => None,
    }
}

/// Expiry warning when less than `warning_days` remain and time is not up
pub fn account_expiry_notification(
    account: Option<&AccountData>,
    warning_days: u32,
    now: DateTime<Utc>,
) -> Option<InAppNotification> {
    let account = account?;
    if now >= expiry_window_start(account, warning_days) && !account.is_expired(now) {
        Some(InAppNotification::AccountExpiry {
            expiry: account.expiry,
        })
    } else {
        None
    }
}

fn expiry_window_start(account: &AccountData, warning_days: u32) -> DateTime<Utc> {
    account
        .expiry
        .checked_sub_signed(Duration::days(i64::from(warning_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Next moment the expiry notification appears or goes away
pub fn next_expiry_boundary(
    account: Option<&AccountData>,
    warning_days: u32,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let account = account?;
    let window_start = expiry_window_start(account, warning_days);
    if now < window_start {
        Some(window_start)
    } else if !account.is_expired(now) {
        Some(account.expiry)
    } else {
        None
    }
}

pub fn version_notification(version: &VersionInfo) -> Option<InAppNotification> {
    if !version.is_supported {
        return Some(InAppNotification::UnsupportedVersion {
            version: version.current.clone(),
        });
    }
    version
        .suggested_upgrade
        .as_ref()
        .map(|upgrade| InAppNotification::UpdateAvailable {
            version: upgrade.clone(),
        })
}

/// Sort by priority, then severity, keeping insertion order for ties
pub fn sort_notifications(notifications: &mut [InAppNotification]) {
    notifications.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| b.status_level().cmp(&a.status_level()))
    });
}

/// Inputs watched by the [`NotificationController`]
#[derive(Debug, Clone)]
pub struct NotificationSources {
    pub tunnel_state: watch::Receiver<TunnelState>,
    pub account_data: watch::Receiver<Option<AccountData>>,
    pub new_device: watch::Receiver<Option<String>>,
    pub version_info: watch::Receiver<VersionInfo>,
}

pub struct NotificationController {
    sources: NotificationSources,
    warning_days: u32,
}

impl NotificationController {
    pub fn new(sources: NotificationSources, config: &ConnectConfig) -> Self {
        Self {
            sources,
            warning_days: config.expiry_warning_days,
        }
    }

    /// Current ordered notification list
    pub fn current(&self, now: DateTime<Utc>) -> Vec<InAppNotification> {
        let mut notifications: Vec<InAppNotification> = [
            tunnel_state_notification(&self.sources.tunnel_state.borrow()),
            version_notification(&self.sources.version_info.borrow()),
            account_expiry_notification(
                self.sources.account_data.borrow().as_ref(),
                self.warning_days,
                now,
            ),
            self.sources
                .new_device
                .borrow()
                .as_ref()
                .map(|name| InAppNotification::NewDevice {
                    device_name: name.clone(),
                }),
        ]
        .into_iter()
        .flatten()
        .collect();

        sort_notifications(&mut notifications);
        notifications
    }

    /// Keep the list up to date from inside `scope`
    ///
    /// Besides source changes, a timer refreshes the list when the account
    /// enters the expiry warning window and again when it expires.
    pub fn launch(mut self, scope: &ViewModelScope) -> watch::Receiver<Vec<InAppNotification>> {
        let (tx, rx) = watch::channel(self.current(Utc::now()));

        scope.launch(async move {
            // Boundary the timer has already fired for; the wall clock may
            // lag behind the timer
            let mut reached: Option<DateTime<Utc>> = None;

            loop {
                let now = reached.map_or_else(Utc::now, |at| at.max(Utc::now()));
                let boundary = next_expiry_boundary(
                    self.sources.account_data.borrow().as_ref(),
                    self.warning_days,
                    now,
                );
                let remaining = boundary.and_then(|at| (at - now).to_std().ok());
                let boundary_timer = async {
                    match remaining {
                        Some(remaining) => tokio::time::sleep(remaining).await,
                        None => std::future::pending::<()>().await,
                    }
                };

                tokio::select! {
                    Ok(()) = self.sources.tunnel_state.changed() => {}
                    Ok(()) = self.sources.account_data.changed() => {}
                    Ok(()) = self.sources.new_device.changed() => {}
                    Ok(()) = self.sources.version_info.changed() => {}
                    () = boundary_timer, if remaining.is_some() => {
                        debug!(?boundary, "Account expiry boundary reached");
                        reached = boundary;
                    }
                    else => break,
                }

                let now = reached.map_or_else(Utc::now, |at| at.max(Utc::now()));
                let notifications = self.current(now);
                debug!(count = notifications.len(), "Notifications updated");
                tx.send_if_modified(|current| {
                    if *current == notifications {
                        false
                    } else {
                        *current = notifications;
                        true
                    }
                });
            }
            debug!("Notification sources closed");
        });

        rx
    }
}
