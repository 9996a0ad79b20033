//! Location use cases feeding the connect screen
//!
//! Maps the relay selection to a title and remembers where the user was
//! last seen while disconnected.

use crate::scope::ViewModelScope;
use crate::tunnel::TunnelState;
use crate::types::GeoIpLocation;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// A single relay location, from coarse to specific
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayLocation {
    pub country: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

impl RelayLocation {
    /// Most specific name available
    pub fn name(&self) -> &str {
        self.hostname
            .as_deref()
            .or(self.city.as_deref())
            .unwrap_or(self.country.as_str())
    }
}

/// Something the user can pick as exit or entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelayItem {
    Location(RelayLocation),
    CustomList { name: String },
}

impl RelayItem {
    pub fn title(&self) -> &str {
        match self {
            RelayItem::Location(location) => location.name(),
            RelayItem::CustomList { name } => name,
        }
    }
}

/// Current relay selection, with an entry hop when multihop is enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayItemSelection {
    pub exit: RelayItem,
    #[serde(default)]
    pub entry: Option<RelayItem>,
}

/// Title shown on the connect button area
pub fn selected_location_title(selection: Option<&RelayItemSelection>) -> Option<String> {
    let selection = selection?;
    Some(match &selection.entry {
        Some(entry) => format!("{} via {}", selection.exit.title(), entry.title()),
        None => selection.exit.title().to_string(),
    })
}

/// Forward `selection` changes as titles
pub struct SelectedLocationTitleUseCase;

impl SelectedLocationTitleUseCase {
    pub fn launch(
        mut selection: watch::Receiver<Option<RelayItemSelection>>,
        scope: &ViewModelScope,
    ) -> watch::Receiver<Option<String>> {
        let (tx, rx) = watch::channel(selected_location_title(selection.borrow().as_ref()));

        scope.launch(async move {
            while selection.changed().await.is_ok() {
                let title = selected_location_title(selection.borrow_and_update().as_ref());
                tx.send_if_modified(|current| {
                    if *current == title {
                        false
                    } else {
                        *current = title;
                        true
                    }
                });
            }
        });

        rx
    }
}

/// Remembers the last location reported while disconnected
pub struct LastKnownLocationUseCase;

impl LastKnownLocationUseCase {
    pub fn launch(
        mut tunnel_state: watch::Receiver<TunnelState>,
        scope: &ViewModelScope,
    ) -> watch::Receiver<Option<GeoIpLocation>> {
        let initial = disconnected_location(&tunnel_state.borrow());
        let (tx, rx) = watch::channel(initial);

        scope.launch(async move {
            while tunnel_state.changed().await.is_ok() {
                let location = disconnected_location(&tunnel_state.borrow_and_update());
                if let Some(location) = location {
                    tx.send_if_modified(|current| {
                        if current.as_ref() == Some(&location) {
                            false
                        } else {
                            *current = Some(location);
                            true
                        }
                    });
                }
            }
        });

        rx
    }
}

fn disconnected_location(state: &TunnelState) -> Option<GeoIpLocation> {
    match state {
        TunnelState::Disconnected { location } => location.clone(),
        _ => None,
    }
}
