//! Resolver connections for the protected dialer.
//!
//! Whenever name resolution needs to reach a DNS server, the server address
//! is replaced by a system resolver of the same family (see
//! [`replace_ip`](crate::protect::family::replace_ip)) and the connection is
//! opened through the dialer's own protected socket path. DNS traffic that
//! skipped protection would be captured by the VPN and loop back into it.

use crate::base::neterror::NetError;
use crate::protect::family::replace_ip;
use crate::protect::Protector;
use crate::socket::dialer::{unspecified_for, Dialer};
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::net::{TcpStream, UdpSocket};

/// Redirects and opens resolver connections over protected sockets.
#[derive(Clone)]
pub struct ResolverDial {
    protector: Arc<dyn Protector>,
    dialer: Dialer,
    // Hickory only keeps the text of io errors it sees, so the typed
    // redirection failure is parked here for the lookup to pick up.
    rewrite_error: Arc<Mutex<Option<NetError>>>,
}

impl ResolverDial {
    /// `dialer` must be the protected dialer whose lookups this serves.
    pub fn new(protector: Arc<dyn Protector>, dialer: Dialer) -> Self {
        Self {
            protector,
            dialer,
            rewrite_error: Arc::default(),
        }
    }

    /// The same redirection, opening sockets with `dialer`'s options.
    pub fn with_dialer(&self, dialer: Dialer) -> Self {
        Self {
            protector: self.protector.clone(),
            dialer,
            rewrite_error: self.rewrite_error.clone(),
        }
    }

    /// The dialer resolver sockets are opened with.
    pub fn dialer(&self) -> &Dialer {
        &self.dialer
    }

    /// Rewrites a resolver address using the protector's current resolver list.
    pub fn rewrite(&self, server: SocketAddr) -> Result<SocketAddr, NetError> {
        let result = self.redirect(server);
        *self.rewrite_slot() = result.as_ref().err().cloned();
        result
    }

    fn redirect(&self, server: SocketAddr) -> Result<SocketAddr, NetError> {
        let resolvers = self.protector.resolvers();
        let rewritten = replace_ip(&server.to_string(), &resolvers)?;

        let target: SocketAddr = rewritten
            .parse()
            .map_err(|_| NetError::invalid_address(rewritten.as_str(), "cannot parse resolver-ip"))?;
        tracing::debug!(from = %server, to = %target, "redirecting resolver connection");
        Ok(target)
    }

    /// The most recent redirection failure, if the last rewrite failed.
    pub(crate) fn take_rewrite_error(&self) -> Option<NetError> {
        self.rewrite_slot().take()
    }

    fn rewrite_slot(&self) -> std::sync::MutexGuard<'_, Option<NetError>> {
        self.rewrite_error.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a protected TCP connection to the resolver replacing `server`.
    ///
    /// Without a per-query `timeout` the dialer's own timeout applies.
    pub async fn connect_tcp(
        &self,
        server: SocketAddr,
        bind: Option<SocketAddr>,
        timeout: Option<Duration>,
    ) -> Result<TcpStream, NetError> {
        let target = self.rewrite(server)?;
        let bind = bind.filter(|local| local.is_ipv4() == target.is_ipv4());
        let connect = self.dialer.connect_tcp_to(target, bind);

        match timeout.or(self.dialer.timeout) {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .map_err(|_| NetError::ConnectionTimedOut)?,
            None => connect.await,
        }
    }

    /// Opens a protected UDP socket connected to the resolver replacing `server`.
    ///
    /// A wildcard `local` takes the dialer's local address when one of the
    /// resolver's family is set. A `local` of the other family becomes the
    /// wildcard address of the resolver's family.
    pub async fn connect_udp(
        &self,
        local: SocketAddr,
        server: SocketAddr,
    ) -> Result<UdpSocket, NetError> {
        let target = self.rewrite(server)?;
        let local = match self.dialer.bind_addr(&target, None) {
            Some(bound) if local.ip().is_unspecified() => SocketAddr::new(bound.ip(), local.port()),
            _ if local.is_ipv4() == target.is_ipv4() => local,
            _ => unspecified_for(&target),
        };

        self.dialer.connect_udp_to(target, Some(local)).await
    }
}

impl fmt::Debug for ResolverDial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverDial")
            .field("dialer", &self.dialer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protect::RawSocketHandle;
    use tokio::net::TcpListener;

    struct Fixed(Vec<&'static str>);

    impl Protector for Fixed {
        fn protect(&self, _socket: RawSocketHandle) -> bool {
            true
        }

        fn resolvers(&self) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    fn dial(resolvers: Vec<&'static str>) -> ResolverDial {
        ResolverDial::new(Arc::new(Fixed(resolvers)), Dialer::default())
    }

    #[test]
    fn test_rewrite_same_family() {
        let dial = dial(vec!["10.0.0.1", "10.0.0.2"]);
        let target = dial.rewrite("8.8.8.8:53".parse().unwrap()).unwrap();
        assert_eq!(target, "10.0.0.1:53".parse().unwrap());
    }

    #[test]
    fn test_rewrite_fallback_family() {
        let dial = dial(vec!["2001:db8::1"]);
        let target = dial.rewrite("8.8.8.8:53".parse().unwrap()).unwrap();
        assert_eq!(target, "[2001:db8::1]:53".parse().unwrap());
    }

    #[test]
    fn test_rewrite_no_resolvers() {
        let dial = dial(vec![]);
        assert!(matches!(
            dial.rewrite("8.8.8.8:53".parse().unwrap()),
            Err(NetError::NoResolvers)
        ));
    }

    #[test]
    fn test_rewrite_unparseable_fallback() {
        // Fallback picks the first entry even if it is not an IP literal.
        let dial = dial(vec!["resolver.invalid", "10.0.0.1"]);
        let err = dial.rewrite("[2001:4860:4860::8888]:53".parse().unwrap()).unwrap_err();
        assert!(matches!(err, NetError::InvalidAddress { .. }));
    }

    #[test]
    fn test_failed_rewrite_is_recorded_until_taken() {
        let dial = dial(vec![]);
        let shared = dial.with_dialer(Dialer::default());

        assert!(dial.rewrite("8.8.8.8:53".parse().unwrap()).is_err());
        assert!(matches!(shared.take_rewrite_error(), Some(NetError::NoResolvers)));
        assert!(dial.take_rewrite_error().is_none());
    }

    #[test]
    fn test_successful_rewrite_clears_recorded_error() {
        // A v4 server has no v4 resolver and falls back to the hostname entry;
        // a v6 server finds the v6 entry.
        let dial = dial(vec!["resolver.invalid", "2001:db8::53"]);

        let err = dial.rewrite("8.8.8.8:53".parse().unwrap()).unwrap_err();
        assert!(matches!(err, NetError::InvalidAddress { .. }));

        dial.rewrite("[2001:4860:4860::8888]:53".parse().unwrap()).unwrap();
        assert!(dial.take_rewrite_error().is_none());
    }

    #[tokio::test]
    async fn test_connect_tcp_uses_dialer_keep_alive() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let dial = dial(vec!["127.0.0.1"]).with_dialer(Dialer::new().keep_alive(Duration::from_secs(30)));

        let server: SocketAddr = ([192, 0, 2, 53], port).into();
        let stream = dial.connect_tcp(server, None, None).await.unwrap();
        let (_accepted, peer) = listener.accept().await.unwrap();

        assert_eq!(peer, stream.local_addr().unwrap());
        assert!(socket2::SockRef::from(&stream).keepalive().unwrap());
    }
}
