//! Type definitions shared by the connect screen and its collaborators
//!
//! Sensitive values such as the website auth token are wrapped with the
//! secrecy crate so they never show up in logs or debug output.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

/// Geographic information about the current exit IP
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoIpLocation {
    #[serde(default)]
    pub ipv4: Option<Ipv4Addr>,
    #[serde(default)]
    pub ipv6: Option<Ipv6Addr>,
    pub country: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    /// Exit relay hostname, when connected through a relay
    #[serde(default)]
    pub hostname: Option<String>,
    /// Entry relay hostname for multihop connections
    #[serde(default)]
    pub entry_hostname: Option<String>,
}

impl GeoIpLocation {
    /// Create a location that only knows its country
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            ipv4: None,
            ipv6: None,
            country: country.into(),
            city: None,
            latitude: 0.0,
            longitude: 0.0,
            hostname: None,
            entry_hostname: None,
        }
    }

    /// Outbound address as shown to the user: IPv4 preferred, then IPv6
    pub fn out_address(&self) -> Option<String> {
        self.ipv4
            .map(|ip| ip.to_string())
            .or_else(|| self.ipv6.map(|ip| ip.to_string()))
    }
}

/// Transport protocol of a tunnel endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    Udp,
    Tcp,
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportProtocol::Udp => write!(f, "UDP"),
            TransportProtocol::Tcp => write!(f, "TCP"),
        }
    }
}

/// A socket address plus the protocol spoken on it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: SocketAddr,
    pub protocol: TransportProtocol,
}

impl Endpoint {
    pub fn new(address: SocketAddr, protocol: TransportProtocol) -> Self {
        Self { address, protocol }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, self.protocol)
    }
}

/// Endpoints making up an established or pending tunnel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelEndpoint {
    /// Exit relay endpoint
    pub endpoint: Endpoint,
    /// Entry relay endpoint when multihop is in use
    #[serde(default)]
    pub entry_endpoint: Option<Endpoint>,
    /// Obfuscation proxy the client actually talks to, if any
    #[serde(default)]
    pub obfuscation: Option<Endpoint>,
    #[serde(default)]
    pub quantum_resistant: bool,
}

impl TunnelEndpoint {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            entry_endpoint: None,
            obfuscation: None,
            quantum_resistant: false,
        }
    }

    /// The outermost endpoint packets leave this device for
    pub fn in_endpoint(&self) -> &Endpoint {
        self.obfuscation
            .as_ref()
            .or(self.entry_endpoint.as_ref())
            .unwrap_or(&self.endpoint)
    }

    /// Inbound address string, e.g. `185.65.135.2:51820 UDP`
    pub fn in_address(&self) -> String {
        self.in_endpoint().to_string()
    }
}

/// Account number of a logged in user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountId(pub String);

/// Account data as last fetched from the API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    pub id: AccountId,
    pub expiry: DateTime<Utc>,
}

impl AccountData {
    pub fn new(id: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        Self {
            id: AccountId(id.into()),
            expiry,
        }
    }

    /// Whole days until expiry, truncated towards zero
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        (self.expiry - now).num_days()
    }

    /// Whether the account has run out of time at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}

/// A device registered on an account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    /// Raw name as assigned by the API, e.g. `happy otter`
    pub name: String,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Device name with each word capitalised
    pub fn display_name(&self) -> String {
        self.name
            .split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Login state of this device
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeviceState {
    /// Not yet loaded from the daemon
    #[default]
    Unknown,
    LoggedIn { account: AccountId, device: Device },
    LoggedOut,
    /// The device was removed from the account by another client
    Revoked,
}

impl DeviceState {
    pub fn display_name(&self) -> Option<String> {
        match self {
            DeviceState::LoggedIn { device, .. } => Some(device.display_name()),
            _ => None,
        }
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self, DeviceState::Revoked)
    }
}

/// Short-lived token used to log in on the account website
#[derive(Clone, Debug)]
pub struct WebsiteAuthToken(Secret<String>);

impl WebsiteAuthToken {
    pub fn new(token: String) -> Self {
        Self(Secret::new(token))
    }

    /// Expose the token value (use with caution!)
    ///
    /// Only needed when building the URL handed to the browser.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for WebsiteAuthToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl PartialEq for WebsiteAuthToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for WebsiteAuthToken {}

/// Version information of the running app
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub current: String,
    #[serde(default = "default_supported")]
    pub is_supported: bool,
    #[serde(default)]
    pub suggested_upgrade: Option<String>,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            current: env!("CARGO_PKG_VERSION").to_string(),
            is_supported: true,
            suggested_upgrade: None,
        }
    }
}

fn default_supported() -> bool {
    true
}
