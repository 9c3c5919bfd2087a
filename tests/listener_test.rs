//! Protected Listener Tests
//!
//! Covers:
//! - Nil protector yields a default listen config
//! - Listening sockets are protected before they are bound
//! - Listeners never consult the resolver list

use protectnet::protect::{Protector, RawSocketHandle};
use protectnet::socket::{make_dialer, make_listen_config, ListenConfig, Listener, Network};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct CountingProtector {
    protected: AtomicUsize,
    resolver_queries: AtomicUsize,
}

impl Protector for CountingProtector {
    fn protect(&self, _socket: RawSocketHandle) -> bool {
        self.protected.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn resolvers(&self) -> Vec<String> {
        self.resolver_queries.fetch_add(1, Ordering::SeqCst);
        vec!["10.0.0.1".to_string()]
    }
}

#[test]
fn test_nil_protector_listen_config_is_default() {
    let config = make_listen_config(None);
    assert!(config.control().is_none());
    assert!(config.backlog.is_none());
    assert_eq!(format!("{:?}", config), format!("{:?}", ListenConfig::default()));
}

#[tokio::test]
async fn test_listen_tcp_is_protected() {
    let protector = Arc::new(CountingProtector::default());
    let config = make_listen_config(Some(protector.clone()));

    let listener = config.listen_tcp("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();

    // An unprotected dialer connects to the protected listener.
    let client = make_dialer(None).dial_tcp(&addr.to_string()).await.unwrap();
    let (_server, peer) = listener.accept().await.unwrap();

    assert_eq!(peer, client.local_addr().unwrap());
    assert_eq!(protector.protected.load(Ordering::SeqCst), 1);
    assert_eq!(protector.resolver_queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_listen_udp_is_protected() {
    let protector = Arc::new(CountingProtector::default());
    let config = make_listen_config(Some(protector.clone()));

    let listener = config.listen(Network::Udp, "127.0.0.1:0").unwrap();
    let socket = match listener {
        Listener::Udp(socket) => socket,
        Listener::Tcp(_) => panic!("Expected a UDP socket"),
    };

    let sender = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender
        .send_to(b"hi", socket.local_addr().unwrap())
        .await
        .unwrap();
    let mut buf = [0u8; 8];
    let (n, _) = socket.recv_from(&mut buf).await.unwrap();

    assert_eq!(&buf[..n], b"hi");
    assert_eq!(protector.protected.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_listen_with_backlog() {
    let protector = Arc::new(CountingProtector::default());
    let config = make_listen_config(Some(protector.clone())).backlog(16);
    assert_eq!(config.backlog, Some(16));

    let listener = config.listen(Network::Tcp4, "127.0.0.1:0").unwrap();
    assert!(matches!(listener, Listener::Tcp(_)));
    assert_eq!(protector.protected.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_listen_family_mismatch() {
    let config = ListenConfig::new();
    assert!(config.listen(Network::Tcp6, "127.0.0.1:0").is_err());
}
