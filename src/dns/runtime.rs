//! Hickory runtime provider that routes resolver traffic through
//! [`ResolverDial`].
//!
//! Hickory opens one socket per name server exchange. This provider swaps the
//! configured name server for a system resolver and opens the socket through
//! the protected dialer. UDP sockets are connected to the substitute resolver
//! and report the original name server as the peer, so hickory's response
//! source checks still pass.

use crate::socket::resolver_dial::ResolverDial;
use hickory_resolver::proto::{
    runtime::{iocompat::AsyncIoTokioAsStd, RuntimeProvider, TokioRuntimeProvider, TokioTime},
    udp::DnsUdpSocket,
};
use std::{
    future::Future,
    io,
    net::SocketAddr,
    pin::Pin,
    task::{ready, Context, Poll},
    time::Duration,
};
use tokio::io::ReadBuf;
use tokio::net::{TcpStream, UdpSocket};

/// Runtime provider whose sockets are redirected and protected.
#[derive(Clone)]
pub struct ProtectedRuntimeProvider {
    runtime: TokioRuntimeProvider,
    dial: ResolverDial,
}

impl ProtectedRuntimeProvider {
    pub fn new(dial: ResolverDial) -> Self {
        Self {
            runtime: TokioRuntimeProvider::default(),
            dial,
        }
    }
}

impl RuntimeProvider for ProtectedRuntimeProvider {
    type Handle = <TokioRuntimeProvider as RuntimeProvider>::Handle;
    type Timer = TokioTime;
    type Udp = ResolverUdpSocket;
    type Tcp = AsyncIoTokioAsStd<TcpStream>;

    fn create_handle(&self) -> Self::Handle {
        self.runtime.create_handle()
    }

    fn connect_tcp(
        &self,
        server_addr: SocketAddr,
        bind_addr: Option<SocketAddr>,
        timeout: Option<Duration>,
    ) -> Pin<Box<dyn Send + Future<Output = io::Result<Self::Tcp>>>> {
        let dial = self.dial.clone();
        Box::pin(async move {
            let stream = dial.connect_tcp(server_addr, bind_addr, timeout).await?;
            Ok(AsyncIoTokioAsStd(stream))
        })
    }

    fn bind_udp(
        &self,
        local_addr: SocketAddr,
        server_addr: SocketAddr,
    ) -> Pin<Box<dyn Send + Future<Output = io::Result<Self::Udp>>>> {
        let dial = self.dial.clone();
        Box::pin(async move {
            let socket = dial.connect_udp(local_addr, server_addr).await?;
            Ok(ResolverUdpSocket {
                socket,
                server: server_addr,
            })
        })
    }
}

/// UDP socket connected to a substitute resolver.
///
/// Sends ignore the requested target; receives report `server` as the source.
#[derive(Debug)]
pub struct ResolverUdpSocket {
    socket: UdpSocket,
    server: SocketAddr,
}

impl DnsUdpSocket for ResolverUdpSocket {
    type Time = TokioTime;

    fn poll_recv_from(
        &self,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<(usize, SocketAddr)>> {
        let mut buf = ReadBuf::new(buf);
        ready!(self.socket.poll_recv(cx, &mut buf))?;
        Poll::Ready(Ok((buf.filled().len(), self.server)))
    }

    fn poll_send_to(
        &self,
        cx: &mut Context<'_>,
        buf: &[u8],
        _target: SocketAddr,
    ) -> Poll<io::Result<usize>> {
        self.socket.poll_send(cx, buf)
    }
}
