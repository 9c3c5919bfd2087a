//! Resolver address-family matching.
//!
//! When the process resolves names itself, each resolver connection is
//! redirected to a system resolver. The substitute keeps the address family
//! of the original resolver address where the system offers one, and the
//! port is never touched.

use crate::base::hostport::{join_host_port, split_host_port};
use crate::base::neterror::NetError;
use std::net::IpAddr;

/// Returns `true` if `ip` has a 4-byte form (IPv4 or IPv4-mapped IPv6).
pub fn is_ipv4_like(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(_) => true,
        IpAddr::V6(v6) => v6.to_ipv4_mapped().is_some(),
    }
}

/// Returns the first address in `ips` of the wanted family.
///
/// Entries that do not parse as IP addresses are skipped.
pub fn scan<S: AsRef<str>>(ips: &[S], want_v4: bool) -> Option<&str> {
    for ip in ips {
        let ip: &str = ip.as_ref();
        match ip.parse::<IpAddr>() {
            Ok(parsed) if is_ipv4_like(&parsed) == want_v4 => return Some(ip),
            _ => continue,
        }
    }
    None
}

/// Replaces the host of `addr` with a resolver from `ips`.
///
/// Picks the first resolver of the same family as the original host, or
/// `ips[0]` when no resolver of that family exists. The port is kept as is.
pub fn replace_ip<S: AsRef<str>>(addr: &str, ips: &[S]) -> Result<String, NetError> {
    let first = ips.first().ok_or(NetError::NoResolvers)?;

    let (orig_host, port) = split_host_port(addr)?;
    let orig_ip: IpAddr = orig_host
        .parse()
        .map_err(|_| NetError::invalid_address(addr, "cannot parse resolver-ip"))?;

    // No resolver of the desired family: use one of a different family.
    let fallback: &str = first.as_ref();
    let new_ip = scan(ips, is_ipv4_like(&orig_ip)).unwrap_or(fallback);

    Ok(join_host_port(new_ip, port))
}
