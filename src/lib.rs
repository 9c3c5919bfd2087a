//! # protectnet
//!
//! Protected sockets for VPN clients.
//!
//! A VPN client's own connections (to upstream proxies, to DNS servers) must
//! bypass the VPN it provides, or the process routes its traffic back into
//! itself. On platforms without a loopback-exclusion API the host offers a
//! per-socket "protect" call instead. `protectnet` wires that call into every
//! socket a dialer or listener creates, and redirects the dialer's DNS traffic
//! to the system resolver of the matching address family.
//!
//! ## Features
//!
//! - **Protected sockets**: every TCP/UDP socket is protected before connect/bind/listen
//! - **Resolver redirection**: name server connections go to the system resolvers,
//!   same address family first, over protected sockets
//! - **Nil-safe factories**: without a protector, plain default dialers and listeners
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use protectnet::protect::{HostAdapter, HostProtector};
//! use protectnet::socket::{make_dialer, make_listen_config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let protector = HostAdapter::shared(vpn_service);
//!     let dialer = make_dialer(Some(protector.clone()));
//!     let stream = dialer.dial_tcp("proxy.example.com:443").await.unwrap();
//!
//!     let listen = make_listen_config(Some(protector));
//!     let listener = listen.listen_tcp("127.0.0.1:1080".parse().unwrap()).unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and address helpers
//! - [`protect`] - Protector capability, socket hook, resolver family matching
//! - [`dns`] - System and protected resolvers
//! - [`socket`] - Dialer and listener factories

pub mod base;
pub mod dns;
pub mod protect;
pub mod socket;

pub use base::neterror::NetError;
pub use protect::{HostAdapter, HostProtector, Protector};
pub use socket::{make_dialer, make_listen_config, Dialer, ListenConfig};
