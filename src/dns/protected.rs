//! Async DNS resolver whose name server traffic is protected.
//!
//! Backed by hickory-dns with a [`ProtectedRuntimeProvider`]: every socket
//! hickory opens to a name server is redirected to a system resolver of the
//! same address family and protected from VPN capture.

use super::runtime::ProtectedRuntimeProvider;
use super::{Addrs, Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use crate::socket::dialer::{Dialer, SocketOptions};
use crate::socket::resolver_dial::ResolverDial;
use hickory_resolver::{
    config::{LookupIpStrategy, NameServerConfig, ResolverConfig},
    name_server::GenericConnector,
    proto::xfer::Protocol,
    Resolver,
};
use std::{
    fmt, io,
    net::SocketAddr,
    sync::{Mutex, PoisonError},
    time::Duration,
};

type ProtectedConnector = GenericConnector<ProtectedRuntimeProvider>;

/// Resolver tuning for protected dialers.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Per-query timeout
    pub timeout: Duration,
    /// Attempts per name server before giving up
    pub attempts: usize,
    /// Which address families to look up
    pub ip_strategy: LookupIpStrategy,
    /// Name servers to query before redirection; `None` reads the system
    /// configuration and falls back to hickory's defaults
    pub upstream: Option<ResolverConfig>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            attempts: 2,
            ip_strategy: LookupIpStrategy::Ipv4AndIpv6,
            upstream: None,
        }
    }
}

impl ResolverSettings {
    /// Create settings with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-query timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the attempts per name server.
    pub fn attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the lookup strategy.
    pub fn ip_strategy(mut self, strategy: LookupIpStrategy) -> Self {
        self.ip_strategy = strategy;
        self
    }

    /// Query exactly these name servers over `protocol`.
    ///
    /// The addresses still pass through resolver redirection; only their
    /// family and port survive it.
    pub fn name_servers(mut self, servers: &[SocketAddr], protocol: Protocol) -> Self {
        let group: Vec<NameServerConfig> = servers
            .iter()
            .map(|addr| NameServerConfig::new(*addr, protocol))
            .collect();
        self.upstream = Some(ResolverConfig::from_parts(None, Vec::new(), group));
        self
    }
}

/// Hickory-backed resolver that reaches name servers through [`ResolverDial`].
///
/// Name server sockets are opened with the options of the dialer doing the
/// lookup. The hickory resolver is built on first use, shared by every clone
/// of the owning dialer, and rebuilt when those options change.
pub struct ProtectedResolver {
    dial: ResolverDial,
    settings: ResolverSettings,
    cached: Mutex<Option<CachedResolver>>,
}

struct CachedResolver {
    options: SocketOptions,
    resolver: Resolver<ProtectedConnector>,
}

impl ProtectedResolver {
    pub fn new(dial: ResolverDial, settings: ResolverSettings) -> Self {
        Self {
            dial,
            settings,
            cached: Mutex::new(None),
        }
    }

    /// The resolver-connection path used when no dialer is given.
    pub fn dial(&self) -> &ResolverDial {
        &self.dial
    }

    /// The resolver-connection path for lookups made by `dialer`.
    pub fn dial_for(&self, dialer: &Dialer) -> ResolverDial {
        self.dial.with_dialer(dialer.without_resolver())
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolves `name` with name server sockets opened the way `dialer`
    /// opens its own.
    pub fn resolve_for(&self, name: Name, dialer: &Dialer) -> Resolving {
        let resolver = self.resolver_for(dialer);
        let dial = self.dial.clone();

        Box::pin(async move {
            let domain = name.as_str();
            tracing::debug!(domain = %domain, "resolving via protected resolver");

            let lookup = resolver.lookup_ip(domain).await.map_err(|e| {
                tracing::debug!(domain = %domain, error = %e, "protected lookup failed");
                dial.take_rewrite_error().unwrap_or_else(|| {
                    NetError::dns_failed(domain, io::Error::new(io::ErrorKind::NotFound, e.to_string()))
                })
            })?;

            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();

            if addrs.is_empty() {
                return Err(NetError::dns_failed(
                    domain,
                    io::Error::new(io::ErrorKind::NotFound, "No addresses returned"),
                ));
            }

            tracing::debug!(domain = %domain, count = addrs.len(), "protected resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }

    fn resolver_for(&self, dialer: &Dialer) -> Resolver<ProtectedConnector> {
        let options = dialer.socket_options();
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = cached.as_ref().filter(|entry| entry.options == options) {
            return entry.resolver.clone();
        }

        let resolver = self.build(self.dial_for(dialer));
        *cached = Some(CachedResolver {
            options,
            resolver: resolver.clone(),
        });
        resolver
    }

    fn build(&self, dial: ResolverDial) -> Resolver<ProtectedConnector> {
        let provider = GenericConnector::new(ProtectedRuntimeProvider::new(dial));

        let mut builder = match &self.settings.upstream {
            Some(config) => Resolver::builder_with_config(config.clone(), provider),
            None => match Resolver::builder(provider.clone()) {
                Ok(builder) => {
                    tracing::debug!("Using system DNS configuration");
                    builder
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to read system DNS config, using defaults"
                    );
                    Resolver::builder_with_config(ResolverConfig::default(), provider)
                }
            },
        };

        let options = builder.options_mut();
        options.ip_strategy = self.settings.ip_strategy;
        options.timeout = self.settings.timeout;
        options.attempts = self.settings.attempts;

        builder.build()
    }
}

impl Resolve for ProtectedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        self.resolve_for(name, self.dial.dialer())
    }
}

impl fmt::Debug for ProtectedResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectedResolver")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
