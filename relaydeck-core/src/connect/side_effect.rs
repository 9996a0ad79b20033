//! One-shot events emitted by the connect screen
//!
//! Each side effect goes to at most one live observer. Effects sent while
//! nobody observes are dropped, never replayed.

use crate::types::WebsiteAuthToken;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use url::Url;

/// Effects buffered per observer before further ones skip it
const OBSERVER_CAPACITY: usize = 16;

/// Why a connect attempt could not proceed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectErrorEffect {
    Generic,
    /// The user declined the OS VPN permission prompt
    PermissionDenied,
    /// Permission cannot be granted while another app is always-on VPN
    AlwaysOnVpn { app_name: String },
}

/// Account page to open, with an optional login token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPageLink {
    base: Url,
    token: Option<WebsiteAuthToken>,
}

impl AccountPageLink {
    pub fn new(base: Url, token: Option<WebsiteAuthToken>) -> Self {
        Self { base, token }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// URL to hand to the browser; exposes the token
    pub fn to_url(&self) -> Url {
        let mut url = self.base.clone();
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token.expose());
        }
        url
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiSideEffect {
    OpenAccountManagementPageInBrowser(AccountPageLink),
    OutOfTime,
    RevokedDevice,
    /// The OS permission prompt needs to be shown before connecting
    NoVpnPermission,
    ConnectError(ConnectErrorEffect),
}

/// Hands every effect to the oldest observer still listening
#[derive(Debug, Clone, Default)]
pub struct SideEffectSender {
    observers: Arc<Mutex<Vec<mpsc::Sender<UiSideEffect>>>>,
}

impl SideEffectSender {
    pub fn new() -> Self {
        Self::default()
    }

    fn observers(&self) -> MutexGuard<'_, Vec<mpsc::Sender<UiSideEffect>>> {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an observer for effects sent from now on
    pub fn subscribe(&self) -> mpsc::Receiver<UiSideEffect> {
        let (tx, rx) = mpsc::channel(OBSERVER_CAPACITY);
        self.observers().push(tx);
        rx
    }

    /// Deliver `effect` to one live observer; `false` if it was dropped
    pub fn send(&self, effect: UiSideEffect) -> bool {
        let mut observers = self.observers();
        observers.retain(|observer| !observer.is_closed());

        let mut effect = effect;
        for observer in observers.iter() {
            match observer.try_send(effect) {
                Ok(()) => return true,
                Err(TrySendError::Full(returned)) => {
                    warn!("Side effect observer is not keeping up");
                    effect = returned;
                }
                Err(TrySendError::Closed(returned)) => effect = returned,
            }
        }

        debug!(?effect, "No live side effect observer, effect dropped");
        false
    }
}
