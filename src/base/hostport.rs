//! `host:port` splitting and joining.
//!
//! IPv6 hosts are bracketed (`[2001:db8::1]:53`). The port is kept as text and
//! never interpreted here, so a split followed by a join preserves it exactly.

use crate::base::neterror::NetError;

/// Splits `host:port` (or `[host]:port`) into its host and port parts.
///
/// The brackets are removed from an IPv6 host. Fails with
/// [`NetError::InvalidAddress`] on a missing port, unbalanced brackets, or an
/// unbracketed host containing colons.
pub fn split_host_port(hostport: &str) -> Result<(&str, &str), NetError> {
    let invalid = |reason| NetError::invalid_address(hostport, reason);

    let last_colon = hostport.rfind(':').ok_or_else(|| invalid("missing port"))?;

    let (host, inner_start, inner_end) = if hostport.starts_with('[') {
        let end = hostport.find(']').ok_or_else(|| invalid("missing ']'"))?;
        if end + 1 == hostport.len() {
            return Err(invalid("missing port"));
        }
        if end + 1 != last_colon {
            if hostport.as_bytes()[end + 1] == b':' {
                return Err(invalid("too many colons"));
            }
            return Err(invalid("missing port"));
        }
        (&hostport[1..end], 1, end + 1)
    } else {
        let host = &hostport[..last_colon];
        if host.contains(':') {
            return Err(invalid("too many colons"));
        }
        (host, 0, 0)
    };

    if hostport[inner_start..].contains('[') {
        return Err(invalid("unexpected '['"));
    }
    if hostport[inner_end..].contains(']') {
        return Err(invalid("unexpected ']'"));
    }

    Ok((host, &hostport[last_colon + 1..]))
}

/// Joins a host and port, bracketing hosts that contain a colon.
pub fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
