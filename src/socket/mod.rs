//! Protected dialers and listeners.
//!
//! - [`dialer`]: outbound TCP/UDP with protected sockets and resolver override
//! - [`listener`]: listening sockets with the protection hook
//! - [`resolver_dial`]: redirected, protected resolver connections
//! - [`network`]: network names and connection types

pub mod dialer;
pub mod listener;
pub mod network;
mod open;
pub mod resolver_dial;

pub use dialer::{make_dialer, make_dialer_with, Dialer};
pub use listener::{make_listen_config, ListenConfig, Listener};
pub use network::{Conn, Network};
pub use resolver_dial::ResolverDial;
