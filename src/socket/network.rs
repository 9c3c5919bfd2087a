use crate::base::neterror::NetError;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use tokio::net::{TcpStream, UdpSocket};

/// Transport and address family of a dial or listen request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// TCP over either family.
    Tcp,
    Tcp4,
    Tcp6,
    /// UDP over either family.
    Udp,
    Udp4,
    Udp6,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Tcp4 => "tcp4",
            Network::Tcp6 => "tcp6",
            Network::Udp => "udp",
            Network::Udp4 => "udp4",
            Network::Udp6 => "udp6",
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Network::Tcp | Network::Tcp4 | Network::Tcp6)
    }

    /// Returns true if this network can reach `ip`.
    pub fn accepts(&self, ip: &IpAddr) -> bool {
        match self {
            Network::Tcp | Network::Udp => true,
            Network::Tcp4 | Network::Udp4 => ip.is_ipv4(),
            Network::Tcp6 | Network::Udp6 => ip.is_ipv6(),
        }
    }

    /// Narrows `tcp`/`udp` to the family of `addr`.
    pub fn for_addr(&self, addr: &SocketAddr) -> Network {
        match (self.is_stream(), addr.is_ipv4()) {
            (true, true) => Network::Tcp4,
            (true, false) => Network::Tcp6,
            (false, true) => Network::Udp4,
            (false, false) => Network::Udp6,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            "udp" => Ok(Network::Udp),
            "udp4" => Ok(Network::Udp4),
            "udp6" => Ok(Network::Udp6),
            _ => Err(NetError::invalid_address(s, "unknown network")),
        }
    }
}

/// A connection opened by [`Dialer::dial`](super::dialer::Dialer::dial).
#[derive(Debug)]
pub enum Conn {
    Tcp(TcpStream),
    /// A UDP socket connected to its peer.
    Udp(UdpSocket),
}

impl Conn {
    pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        match self {
            Conn::Tcp(s) => s.peer_addr(),
            Conn::Udp(s) => s.peer_addr(),
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        match self {
            Conn::Tcp(s) => s.local_addr(),
            Conn::Udp(s) => s.local_addr(),
        }
    }

    pub fn into_tcp(self) -> Option<TcpStream> {
        match self {
            Conn::Tcp(s) => Some(s),
            Conn::Udp(_) => None,
        }
    }

    pub fn into_udp(self) -> Option<UdpSocket> {
        match self {
            Conn::Udp(s) => Some(s),
            Conn::Tcp(_) => None,
        }
    }
}
