//! Listening sockets with the protection hook.
//!
//! Listeners never resolve names, so only the socket hook is configured.

use crate::base::context::IoResultExt;
use crate::base::hostport::split_host_port;
use crate::base::neterror::NetError;
use crate::dns::parse_ip_literal;
use crate::protect::control::{make_control, Control};
use crate::protect::Protector;
use crate::socket::network::Network;
use crate::socket::open;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};

const DEFAULT_BACKLOG: u32 = 1024;

/// Configuration for TCP listeners and bound UDP sockets.
#[derive(Debug, Clone, Default)]
pub struct ListenConfig {
    control: Option<Control>,
    /// Pending connection queue length; `None` uses 1024.
    pub backlog: Option<u32>,
}

/// A socket returned by [`ListenConfig::listen`].
#[derive(Debug)]
pub enum Listener {
    Tcp(TcpListener),
    Udp(UdpSocket),
}

impl Listener {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        match self {
            Listener::Tcp(l) => l.local_addr(),
            Listener::Udp(s) => s.local_addr(),
        }
    }
}

/// Creates a listener configuration whose sockets are protected.
///
/// With `None` this is `ListenConfig::default()`.
pub fn make_listen_config(protector: Option<Arc<dyn Protector>>) -> ListenConfig {
    ListenConfig {
        control: make_control(protector),
        ..ListenConfig::default()
    }
}

impl ListenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control(&self) -> Option<&Control> {
        self.control.as_ref()
    }

    /// Set the listen backlog.
    pub fn backlog(mut self, backlog: u32) -> Self {
        self.backlog = Some(backlog);
        self
    }

    /// Listens on `address` (`ip:port`, or `:port` for the wildcard address).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn listen(&self, network: Network, address: &str) -> Result<Listener, NetError> {
        let (host, port) = split_host_port(address)?;
        let port: u16 = port
            .parse()
            .map_err(|_| NetError::invalid_address(address, "invalid port"))?;

        let addr = if host.is_empty() {
            let ip = match network {
                Network::Tcp6 | Network::Udp6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
                _ => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            };
            SocketAddr::new(ip, port)
        } else {
            parse_ip_literal(host, port)
                .ok_or_else(|| NetError::invalid_address(address, "listen host must be an IP literal"))?
        };

        if !network.accepts(&addr.ip()) {
            return Err(NetError::invalid_address(address, "no suitable address"));
        }

        if network.is_stream() {
            Ok(Listener::Tcp(self.listen_tcp(addr)?))
        } else {
            Ok(Listener::Udp(self.listen_udp(addr)?))
        }
    }

    /// Binds and listens on a TCP socket.
    pub fn listen_tcp(&self, addr: SocketAddr) -> Result<TcpListener, NetError> {
        let socket = open::tcp_socket(self.control.as_ref(), Network::Tcp, &addr)?;
        let name = Network::Tcp.for_addr(&addr).as_str();

        socket.set_reuseaddr(true).socket_context(name)?;
        socket.bind(addr).socket_context(name)?;
        let listener = socket
            .listen(self.backlog.unwrap_or(DEFAULT_BACKLOG))
            .socket_context(name)?;

        tracing::debug!(addr = %addr, protected = self.control.is_some(), "listening");
        Ok(listener)
    }

    /// Binds an unconnected UDP socket.
    pub fn listen_udp(&self, addr: SocketAddr) -> Result<UdpSocket, NetError> {
        let socket = open::udp_socket(self.control.as_ref(), Network::Udp, &addr)?;
        tracing::debug!(addr = %addr, protected = self.control.is_some(), "udp socket bound");
        Ok(socket)
    }
}
