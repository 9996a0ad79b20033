//! Trailing debounce for state emissions

use std::time::Duration;
use tokio::time::Instant;

/// Holds back a value until `window` has passed without a newer one
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Replace the pending value and restart the window
    pub fn push(&mut self, value: T) {
        self.pending = Some((Instant::now() + self.window, value));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Deadline of the pending value, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Wait for the window to close and take the value
    ///
    /// Never completes while nothing is pending, so it can sit in a
    /// `select!` next to the sources.
    pub async fn ready(&mut self) -> T {
        match self.deadline() {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
        match self.pending.take() {
            Some((_, value)) => value,
            None => std::future::pending().await,
        }
    }
}
