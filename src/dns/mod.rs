//! DNS Resolution Module
//!
//! Provides pluggable DNS resolution for dialers:
//! - System resolver (getaddrinfo via thread pool) for unprotected dialers
//! - Protected hickory-dns resolver whose name server sockets are redirected
//!   to the system resolvers and protected from VPN capture
//!
//! # Architecture
//!
//! The `Resolve` trait is the core abstraction that lets a dialer use either
//! resolver interchangeably.
//!
//! # Example
//!
//! ```rust,ignore
//! use protectnet::dns::{Name, Resolve};
//! use protectnet::socket::make_dialer;
//!
//! let dialer = make_dialer(Some(protector));
//! let resolver = dialer.resolver_override().unwrap();
//! let addrs = resolver.resolve(Name::new("example.com")).await?;
//! ```

mod gai;
mod protected;
mod resolve;
mod runtime;

pub use gai::{parse_ip_literal, GaiResolver};
pub use hickory_resolver::{config::LookupIpStrategy, proto::xfer::Protocol};
pub use protected::{ProtectedResolver, ResolverSettings};
pub use resolve::{Addrs, Name, Resolve, Resolving};
pub use runtime::{ProtectedRuntimeProvider, ResolverUdpSocket};
