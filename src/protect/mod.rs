//! Socket protection capability.
//!
//! A VPN client must keep its own sockets out of the tunnel it provides,
//! otherwise its upstream connections and DNS lookups loop back into itself.
//! The host platform (e.g. Android's `VpnService.protect()`) supplies that
//! ability through the [`Protector`] trait.
//!
//! - [`control`]: per-socket hook that protects a raw handle before use
//! - [`family`]: resolver address-family matching and substitution
//! - [`flow`]: per-connection routing decision boundary

pub mod control;
pub mod family;
pub mod flow;

use std::fmt;
use std::sync::Arc;

/// Raw OS socket handle passed to [`Protector::protect`].
pub type RawSocketHandle = std::os::fd::RawFd;

/// Platform capability to bypass the VPN for a single socket.
///
/// Implementations are shared across every connection attempt and must be
/// safe to call concurrently.
pub trait Protector: Send + Sync {
    /// Excludes `socket` from the VPN. Returns `false` if the platform refused.
    fn protect(&self, socket: RawSocketHandle) -> bool;

    /// The system's configured DNS resolvers, in descending preference order.
    fn resolvers(&self) -> Vec<String>;
}

impl<P: Protector + ?Sized> Protector for Arc<P> {
    fn protect(&self, socket: RawSocketHandle) -> bool {
        (**self).protect(socket)
    }

    fn resolvers(&self) -> Vec<String> {
        (**self).resolvers()
    }
}

/// Protector as exposed by a host binding layer that cannot pass typed lists.
///
/// `get_resolvers` returns a comma-separated list of IP literals in roughly
/// descending priority order.
pub trait HostProtector: Send + Sync {
    fn protect(&self, socket: i32) -> bool;

    fn get_resolvers(&self) -> String;
}

/// Adapts a [`HostProtector`] into a [`Protector`].
///
/// This is the only place the comma-joined resolver list is parsed. Entries
/// are trimmed and empty entries dropped, so an empty string yields an empty
/// resolver list.
pub struct HostAdapter<H> {
    host: H,
}

impl<H: HostProtector> HostAdapter<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Wraps the host protector for use with the dialer/listener factories.
    pub fn shared(host: H) -> Arc<dyn Protector>
    where
        H: 'static,
    {
        Arc::new(Self::new(host))
    }

    pub fn into_inner(self) -> H {
        self.host
    }
}

impl<H: HostProtector> Protector for HostAdapter<H> {
    fn protect(&self, socket: RawSocketHandle) -> bool {
        self.host.protect(socket)
    }

    fn resolvers(&self) -> Vec<String> {
        parse_resolver_list(&self.host.get_resolvers())
    }
}

impl<H> fmt::Debug for HostAdapter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostAdapter").finish_non_exhaustive()
    }
}

/// Splits a comma-separated resolver list.
pub fn parse_resolver_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
