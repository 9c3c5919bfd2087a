//! Raw socket creation with the control hook applied.
//!
//! Every socket is created unbound, handed to the [`Control`] hook, and only
//! then bound, connected or put into listening state.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::protect::control::Control;
use crate::socket::network::Network;
use socket2::{Domain, Protocol, SockRef, Socket, TcpKeepalive, Type};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpSocket, UdpSocket};

/// Creates a TCP socket of `addr`'s family and runs the hook on it.
pub(crate) fn tcp_socket(
    control: Option<&Control>,
    network: Network,
    addr: &SocketAddr,
) -> Result<TcpSocket, NetError> {
    let network = network.for_addr(addr);
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .socket_context(network.as_str())?;

    if let Some(control) = control {
        control.apply(network, &socket);
    }
    Ok(socket)
}

/// Enables TCP keep-alive with the given idle time.
pub(crate) fn set_keepalive(socket: &TcpSocket, idle: Duration) -> Result<(), NetError> {
    let keepalive = TcpKeepalive::new().with_time(idle);
    SockRef::from(socket)
        .set_tcp_keepalive(&keepalive)
        .socket_context("tcp")
}

/// Creates a UDP socket, runs the hook on it, and binds it to `local`.
///
/// Must be called from within a Tokio runtime.
pub(crate) fn udp_socket(
    control: Option<&Control>,
    network: Network,
    local: &SocketAddr,
) -> Result<UdpSocket, NetError> {
    let network = network.for_addr(local);
    let name = network.as_str();
    let socket = Socket::new(Domain::for_address(*local), Type::DGRAM, Some(Protocol::UDP))
        .socket_context(name)?;

    if let Some(control) = control {
        control.apply(network, &socket);
    }

    socket.set_nonblocking(true).socket_context(name)?;
    socket.bind(&(*local).into()).socket_context(name)?;
    UdpSocket::from_std(socket.into()).socket_context(name)
}
