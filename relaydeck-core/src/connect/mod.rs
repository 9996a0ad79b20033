//! Connect screen
//!
//! Folds tunnel, account, device, location and notification state into a
//! single debounced UI state, and turns user actions into requests and
//! one-shot side effects.

pub mod debounce;
pub mod effects;
pub mod side_effect;
pub mod ui_state;
pub mod view_model;

// Public re-exports
pub use side_effect::{AccountPageLink, ConnectErrorEffect, SideEffectSender, UiSideEffect};
pub use ui_state::{derive_ui_state, show_location, ConnectInputs, ConnectUiState};
pub use view_model::{ConnectCollaborators, ConnectSources, ConnectViewModel};
