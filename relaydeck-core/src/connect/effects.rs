//! Side effects derived from state transitions
//!
//! Out-of-time and revoked-device effects fire on the rising edge of their
//! condition only, so a screen is not sent twice to the same place.

use crate::connect::side_effect::{SideEffectSender, UiSideEffect};
use crate::tunnel::TunnelState;
use crate::types::{AccountData, DeviceState};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

/// Reports `true` once per false-to-true transition
#[derive(Debug, Default)]
pub struct EdgeDetector {
    active: bool,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, active: bool) -> bool {
        let rising = active && !self.active;
        self.active = active;
        rising
    }
}

/// Whether the account has run out of time, by expiry or by the daemon
/// rejecting the tunnel for an expired account
pub fn is_out_of_time(
    account: Option<&AccountData>,
    tunnel_state: &TunnelState,
    now: DateTime<Utc>,
) -> bool {
    let expired = account.is_some_and(|account| account.is_expired(now));
    let rejected = matches!(
        tunnel_state,
        TunnelState::Error { error_state } if error_state.is_expired_account()
    );
    expired || rejected
}

/// Emit [`UiSideEffect::OutOfTime`] whenever the account runs out of time
///
/// A timer re-evaluates the condition at the moment a future expiry is
/// reached, so time running out while the screen is open is noticed.
pub async fn watch_out_of_time(
    mut account: watch::Receiver<Option<AccountData>>,
    mut tunnel_state: watch::Receiver<TunnelState>,
    effects: SideEffectSender,
) {
    let mut edge = EdgeDetector::new();
    // Expiry the timer has already fired for; counts as expired even if
    // the wall clock lags behind the timer
    let mut reached_expiry: Option<DateTime<Utc>> = None;

    loop {
        let now = Utc::now();
        let account_data = account.borrow_and_update().clone();
        let timer_reached = account_data
            .as_ref()
            .is_some_and(|data| Some(data.expiry) == reached_expiry);
        let out_of_time = timer_reached
            || is_out_of_time(account_data.as_ref(), &tunnel_state.borrow_and_update(), now);

        if edge.observe(out_of_time) {
            info!("Account is out of time");
            effects.send(UiSideEffect::OutOfTime);
        }

        let expiry = account_data
            .as_ref()
            .filter(|_| !out_of_time)
            .and_then(|data| (data.expiry - now).to_std().ok().map(|left| (data.expiry, left)));

        let expiry_timer = async {
            match expiry {
                Some((_, remaining)) => tokio::time::sleep(remaining).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            Ok(()) = account.changed() => {}
            Ok(()) = tunnel_state.changed() => {}
            () = expiry_timer, if expiry.is_some() => {
                debug!("Account expiry reached");
                reached_expiry = expiry.map(|(at, _)| at);
            }
            else => break,
        }
    }
}

/// Emit [`UiSideEffect::RevokedDevice`] when this device gets revoked
pub async fn watch_revoked_device(
    mut device_state: watch::Receiver<DeviceState>,
    effects: SideEffectSender,
) {
    let mut edge = EdgeDetector::new();

    loop {
        let revoked = device_state.borrow_and_update().is_revoked();
        if edge.observe(revoked) {
            info!("Device has been revoked");
            effects.send(UiSideEffect::RevokedDevice);
        }

        if device_state.changed().await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tunnel::{ErrorState, ErrorStateCause, EXPIRED_ACCOUNT_REASON};
    use chrono::Duration;

    #[test]
    fn test_edge_detector_fires_once_per_rise() {
        let mut edge = EdgeDetector::new();
        assert!(!edge.observe(false));
        assert!(edge.observe(true));
        assert!(!edge.observe(true));
        assert!(!edge.observe(false));
        assert!(edge.observe(true));
    }

    #[test]
    fn test_out_of_time_conditions() {
        let now = Utc::now();
        let valid = AccountData::new("1", now + Duration::days(1));
        let expired = AccountData::new("1", now - Duration::days(1));
        let disconnected = TunnelState::default();
        let rejected = TunnelState::Error {
            error_state: ErrorState::new(
                ErrorStateCause::AuthFailed {
                    reason: Some(EXPIRED_ACCOUNT_REASON.into()),
                },
                true,
            ),
        };

        assert!(!is_out_of_time(Some(&valid), &disconnected, now));
        assert!(is_out_of_time(Some(&expired), &disconnected, now));
        assert!(is_out_of_time(Some(&valid), &rejected, now));
        assert!(is_out_of_time(None, &rejected, now));
        assert!(!is_out_of_time(None, &disconnected, now));
    }
}
