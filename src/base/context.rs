//! `io::Error` to `NetError` with the address that failed attached.
//!
//! Socket calls report bare `io::Error`s. Dialers and resolvers wrap them at
//! the call site so a failure names the peer, the domain, or the kind of
//! socket that was being set up.

use crate::base::neterror::NetError;
use std::io;

pub trait IoResultExt<T> {
    /// Tags a connect failure with the peer it was aimed at.
    ///
    /// ```ignore
    /// use protectnet::base::context::IoResultExt;
    ///
    /// let stream = socket.connect(resolver).await
    ///     .connection_context(&resolver.ip().to_string(), resolver.port())?;
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// Tags a system lookup failure with the domain.
    fn dns_context(self, domain: &str) -> Result<T, NetError>;

    /// Tags a create, bind or option failure with the socket's network.
    fn socket_context(self, network: &'static str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| NetError::connection_failed_to(host, port, e))
    }

    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(domain, e))
    }

    fn socket_context(self, network: &'static str) -> Result<T, NetError> {
        self.map_err(|e| NetError::socket_failed(network, e))
    }
}
