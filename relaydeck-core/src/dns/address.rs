//! DNS address parsing and classification

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Parse a candidate DNS server address
///
/// Surrounding whitespace is ignored. Only literal IPv4/IPv6 addresses are
/// accepted; hostnames are not.
pub fn parse_dns_address(input: &str) -> Option<IpAddr> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Whether `address` is only reachable on the local network
pub fn is_local_address(address: &IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => is_local_v4(v4),
        IpAddr::V6(v6) => is_local_v6(v6),
    }
}

fn is_local_v4(address: &Ipv4Addr) -> bool {
    address.is_loopback() || address.is_private() || address.is_link_local()
}

fn is_local_v6(address: &Ipv6Addr) -> bool {
    if address.is_loopback() {
        return true;
    }
    if let Some(mapped) = address.to_ipv4_mapped() {
        return is_local_v4(&mapped);
    }
    let first = address.segments()[0];
    // fc00::/7 unique local
    let unique_local = (first & 0xfe00) == 0xfc00;
    // fe80::/10 link local
    let link_local = (first & 0xffc0) == 0xfe80;
    unique_local || link_local
}
