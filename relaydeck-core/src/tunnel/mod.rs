//! Tunnel module
//!
//! Tunnel phases and the proxy used to drive them.

pub mod state;

// Public re-exports
pub use state::{
    ActionAfterDisconnect, ErrorState, ErrorStateCause, TunnelState, EXPIRED_ACCOUNT_REASON,
};
