//! Outbound connections with protected sockets.
//!
//! [`make_dialer`] returns a [`Dialer`] whose sockets are all passed through
//! the [`Protector`] before they connect, and whose name resolution reaches
//! the system resolvers over protected sockets too. Without a protector the
//! dialer is a plain default one.

use crate::base::context::IoResultExt;
use crate::base::hostport::split_host_port;
use crate::base::neterror::NetError;
use crate::dns::{parse_ip_literal, GaiResolver, Name, ProtectedResolver, Resolve, ResolverSettings};
use crate::protect::control::{make_control, Control};
use crate::protect::Protector;
use crate::socket::network::{Conn, Network};
use crate::socket::open;
use crate::socket::resolver_dial::ResolverDial;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpStream, UdpSocket};

/// The caller-mutable part of a [`Dialer`]: timeout, keep-alive, local address.
pub(crate) type SocketOptions = (Option<Duration>, Option<Duration>, Option<IpAddr>);

/// Opens TCP connections and connected UDP sockets.
///
/// The control hook and resolver override are fixed at construction. The
/// public fields may be changed freely by the caller.
#[derive(Debug, Clone, Default)]
pub struct Dialer {
    control: Option<Control>,
    resolver: Option<Arc<ProtectedResolver>>,
    /// Limit on the whole dial, name resolution included.
    pub timeout: Option<Duration>,
    /// TCP keep-alive idle time; `None` leaves the OS default.
    pub keep_alive: Option<Duration>,
    /// Local address to bind before connecting; port 0 is used.
    pub local_addr: Option<IpAddr>,
}

/// Creates a dialer whose sockets and resolver connections are protected.
///
/// With `None` this is `Dialer::default()`: no hook and no resolver override.
pub fn make_dialer(protector: Option<Arc<dyn Protector>>) -> Dialer {
    make_dialer_with(protector, ResolverSettings::default())
}

/// Like [`make_dialer`], with explicit resolver settings.
pub fn make_dialer_with(protector: Option<Arc<dyn Protector>>, settings: ResolverSettings) -> Dialer {
    let Some(protector) = protector else {
        return Dialer::default();
    };

    let socket_dialer = Dialer {
        control: make_control(Some(protector.clone())),
        ..Dialer::default()
    };
    let resolver = ProtectedResolver::new(ResolverDial::new(protector, socket_dialer.clone()), settings);

    Dialer {
        resolver: Some(Arc::new(resolver)),
        ..socket_dialer
    }
}

impl Dialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The socket hook, if this dialer protects its sockets.
    pub fn control(&self) -> Option<&Control> {
        self.control.as_ref()
    }

    /// The protected resolver used for hostnames, if any.
    pub fn resolver_override(&self) -> Option<&Arc<ProtectedResolver>> {
        self.resolver.as_ref()
    }

    pub fn has_resolver_override(&self) -> bool {
        self.resolver.is_some()
    }

    /// Set the dial timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the TCP keep-alive idle time.
    pub fn keep_alive(mut self, idle: Duration) -> Self {
        self.keep_alive = Some(idle);
        self
    }

    /// Set the local address to bind.
    pub fn local_addr(mut self, addr: IpAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    /// This dialer without its resolver override: the socket path the
    /// override itself connects to name servers with.
    pub(crate) fn without_resolver(&self) -> Dialer {
        Dialer {
            resolver: None,
            ..self.clone()
        }
    }

    pub(crate) fn socket_options(&self) -> SocketOptions {
        (self.timeout, self.keep_alive, self.local_addr)
    }

    /// Connects to `address` (`host:port`) over `network`.
    ///
    /// Hostnames are resolved with the dialer's resolver. Candidates of the
    /// wrong family for `network` are skipped; the rest are tried in order.
    pub async fn dial(&self, network: Network, address: &str) -> Result<Conn, NetError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.dial_inner(network, address))
                .await
                .map_err(|_| {
                    tracing::debug!(address = %address, ?limit, "dial timed out");
                    NetError::ConnectionTimedOut
                })?,
            None => self.dial_inner(network, address).await,
        }
    }

    /// Connects over TCP.
    pub async fn dial_tcp(&self, address: &str) -> Result<TcpStream, NetError> {
        let conn = self.dial(Network::Tcp, address).await?;
        conn.into_tcp().ok_or(NetError::ConnectionFailed)
    }

    /// Opens a UDP socket connected to `address`.
    pub async fn dial_udp(&self, address: &str) -> Result<UdpSocket, NetError> {
        let conn = self.dial(Network::Udp, address).await?;
        conn.into_udp().ok_or(NetError::ConnectionFailed)
    }

    async fn dial_inner(&self, network: Network, address: &str) -> Result<Conn, NetError> {
        let (host, port) = split_host_port(address)?;
        let port: u16 = port
            .parse()
            .map_err(|_| NetError::invalid_address(address, "invalid port"))?;

        let candidates: Vec<SocketAddr> = self
            .resolve_host(network, host, port)
            .await?
            .into_iter()
            .filter(|addr| network.accepts(&addr.ip()))
            .collect();

        if candidates.is_empty() {
            return Err(NetError::invalid_address(address, "no suitable address"));
        }

        let mut last_err = None;
        for addr in candidates {
            match self.connect_addr(network, addr).await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    tracing::debug!(addr = %addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or(NetError::ConnectionFailed))
    }

    async fn resolve_host(
        &self,
        network: Network,
        host: &str,
        port: u16,
    ) -> Result<Vec<SocketAddr>, NetError> {
        if host.is_empty() {
            let loopback = match network {
                Network::Tcp6 | Network::Udp6 => IpAddr::V6(Ipv6Addr::LOCALHOST),
                _ => IpAddr::V4(Ipv4Addr::LOCALHOST),
            };
            return Ok(vec![SocketAddr::new(loopback, port)]);
        }

        if let Some(addr) = parse_ip_literal(host, port) {
            return Ok(vec![addr]);
        }

        let name = Name::new(host);
        let addrs = match &self.resolver {
            Some(resolver) => resolver.resolve_for(name, self).await?,
            None => GaiResolver::new().resolve(name).await?,
        };

        Ok(addrs
            .map(|addr| SocketAddr::new(addr.ip(), port))
            .collect())
    }

    async fn connect_addr(&self, network: Network, addr: SocketAddr) -> Result<Conn, NetError> {
        if network.is_stream() {
            Ok(Conn::Tcp(self.connect_tcp_to(addr, None).await?))
        } else {
            Ok(Conn::Udp(self.connect_udp_to(addr, None).await?))
        }
    }

    /// The bind address for a connection to `remote`, if any applies.
    pub(crate) fn bind_addr(&self, remote: &SocketAddr, explicit: Option<SocketAddr>) -> Option<SocketAddr> {
        explicit.or_else(|| {
            self.local_addr
                .filter(|ip| ip.is_ipv4() == remote.is_ipv4())
                .map(|ip| SocketAddr::new(ip, 0))
        })
    }

    /// Opens a protected TCP connection to an IP address.
    pub(crate) async fn connect_tcp_to(
        &self,
        addr: SocketAddr,
        bind: Option<SocketAddr>,
    ) -> Result<TcpStream, NetError> {
        let socket = open::tcp_socket(self.control.as_ref(), Network::Tcp, &addr)?;

        if let Some(idle) = self.keep_alive {
            open::set_keepalive(&socket, idle)?;
        }
        if let Some(local) = self.bind_addr(&addr, bind) {
            socket.bind(local).socket_context("tcp")?;
        }

        socket
            .connect(addr)
            .await
            .connection_context(&addr.ip().to_string(), addr.port())
    }

    /// Opens a protected UDP socket connected to an IP address.
    pub(crate) async fn connect_udp_to(
        &self,
        addr: SocketAddr,
        bind: Option<SocketAddr>,
    ) -> Result<UdpSocket, NetError> {
        let local = self.bind_addr(&addr, bind).unwrap_or_else(|| unspecified_for(&addr));
        let socket = open::udp_socket(self.control.as_ref(), Network::Udp, &local)?;

        socket
            .connect(addr)
            .await
            .connection_context(&addr.ip().to_string(), addr.port())?;
        Ok(socket)
    }
}

/// Wildcard local address of `addr`'s family.
pub(crate) fn unspecified_for(addr: &SocketAddr) -> SocketAddr {
    let ip = if addr.is_ipv4() {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        IpAddr::V6(Ipv6Addr::UNSPECIFIED)
    };
    SocketAddr::new(ip, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protect::RawSocketHandle;

    struct Fixed(Vec<String>);

    impl Protector for Fixed {
        fn protect(&self, _socket: RawSocketHandle) -> bool {
            true
        }

        fn resolvers(&self) -> Vec<String> {
            self.0.clone()
        }
    }

    #[test]
    fn test_nil_protector_is_default() {
        let dialer = make_dialer(None);
        assert!(dialer.control().is_none());
        assert!(!dialer.has_resolver_override());
        assert!(dialer.timeout.is_none());
        assert_eq!(format!("{:?}", dialer), format!("{:?}", Dialer::default()));
    }

    #[test]
    fn test_protector_sets_both_fields() {
        let dialer = make_dialer(Some(Arc::new(Fixed(vec!["10.0.0.1".into()]))));
        assert!(dialer.control().is_some());
        assert!(dialer.has_resolver_override());
    }

    #[test]
    fn test_caller_options_are_mutable() {
        let mut dialer = make_dialer(Some(Arc::new(Fixed(vec![]))))
            .timeout(Duration::from_secs(3))
            .keep_alive(Duration::from_secs(30));
        dialer.local_addr = Some(IpAddr::V4(Ipv4Addr::LOCALHOST));

        assert_eq!(dialer.timeout, Some(Duration::from_secs(3)));
        assert_eq!(dialer.keep_alive, Some(Duration::from_secs(30)));
        assert!(dialer.control().is_some());
        assert!(dialer.has_resolver_override());
    }

    #[test]
    fn test_without_resolver_keeps_options() {
        let mut dialer = make_dialer(Some(Arc::new(Fixed(vec!["10.0.0.1".into()]))));
        dialer.timeout = Some(Duration::from_secs(1));
        dialer.local_addr = Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 9)));

        let socket_path = dialer.without_resolver();
        assert!(socket_path.control().is_some());
        assert!(!socket_path.has_resolver_override());
        assert_eq!(socket_path.socket_options(), dialer.socket_options());
    }

    #[test]
    fn test_bind_addr_matches_family() {
        let dialer = Dialer::new().local_addr(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7)));
        let v4: SocketAddr = "10.0.0.1:53".parse().unwrap();
        let v6: SocketAddr = "[2001:db8::1]:53".parse().unwrap();

        assert_eq!(dialer.bind_addr(&v4, None), Some("192.0.2.7:0".parse().unwrap()));
        assert_eq!(dialer.bind_addr(&v6, None), None);

        let explicit: SocketAddr = "[::]:5353".parse().unwrap();
        assert_eq!(dialer.bind_addr(&v6, Some(explicit)), Some(explicit));
    }

    #[test]
    fn test_unspecified_for() {
        let v6: SocketAddr = "[2001:db8::1]:53".parse().unwrap();
        assert_eq!(unspecified_for(&v6), "[::]:0".parse().unwrap());
    }

    #[tokio::test]
    async fn test_dial_rejects_bad_address() {
        let dialer = Dialer::new();
        assert!(matches!(
            dialer.dial(Network::Tcp, "127.0.0.1").await,
            Err(NetError::InvalidAddress { .. })
        ));
        assert!(matches!(
            dialer.dial(Network::Tcp, "127.0.0.1:http").await,
            Err(NetError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_dial_family_mismatch() {
        let dialer = Dialer::new();
        let err = dialer.dial(Network::Tcp6, "127.0.0.1:80").await.unwrap_err();
        assert!(matches!(err, NetError::InvalidAddress { reason: "no suitable address", .. }));
    }
}
