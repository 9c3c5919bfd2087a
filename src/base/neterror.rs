use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Address invalid")]
    AddressInvalid,
    #[error("Address unreachable")]
    AddressUnreachable,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Name resolution failed")]
    NameResolutionFailed,
    #[error("Network access denied")]
    NetworkAccessDenied,
    #[error("Address in use")]
    AddressInUse,

    // Protection Errors
    #[error("Failed to protect a {network} socket (fd {fd})")]
    ProtectionFailed { network: &'static str, fd: i32 },
    #[error("No resolvers")]
    NoResolvers,
    #[error("Invalid address {address:?}: {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    // Errors with context
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Name {domain} not resolved: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Failed to set up {network} socket: {source}")]
    SocketFailed {
        network: &'static str,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed => -104,
            NetError::NameNotResolved => -105,
            NetError::AddressInvalid => -108,
            NetError::AddressUnreachable => -109,
            NetError::ConnectionTimedOut => -118,
            NetError::NameResolutionFailed => -137,
            NetError::NetworkAccessDenied => -138,
            NetError::AddressInUse => -147,

            // Custom codes live outside Chromium's net_error_list.h range.
            NetError::ProtectionFailed { .. } => -10000,
            NetError::NoResolvers => -10001,
            NetError::InvalidAddress { .. } => -10002,

            NetError::ConnectionFailedTo { .. } => -104,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::SocketFailed { .. } => -104,

            NetError::Unknown(code) => *code,
        }
    }

    /// Connection failure with host/port context.
    pub fn connection_failed_to(host: &str, port: u16, source: io::Error) -> Self {
        NetError::ConnectionFailedTo {
            host: host.to_string(),
            port,
            source: Arc::new(source),
        }
    }

    /// DNS failure with the domain that failed.
    pub fn dns_failed(domain: &str, source: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(source),
        }
    }

    /// Socket creation or option failure.
    pub fn socket_failed(network: &'static str, source: io::Error) -> Self {
        NetError::SocketFailed {
            network,
            source: Arc::new(source),
        }
    }

    pub fn invalid_address(address: impl Into<String>, reason: &'static str) -> Self {
        NetError::InvalidAddress {
            address: address.into(),
            reason,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -103 => NetError::ConnectionAborted,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -108 => NetError::AddressInvalid,
            -109 => NetError::AddressUnreachable,
            -118 => NetError::ConnectionTimedOut,
            -137 => NetError::NameResolutionFailed,
            -138 => NetError::NetworkAccessDenied,
            -147 => NetError::AddressInUse,
            -10001 => NetError::NoResolvers,
            _ => NetError::Unknown(code),
        }
    }
}

/// Hickory's runtime boundary speaks `io::Error`.
impl From<NetError> for io::Error {
    fn from(err: NetError) -> Self {
        let kind = match &err {
            NetError::NoResolvers
            | NetError::InvalidAddress { .. }
            | NetError::AddressInvalid => io::ErrorKind::InvalidInput,
            NetError::ConnectionRefused => io::ErrorKind::ConnectionRefused,
            NetError::ConnectionReset => io::ErrorKind::ConnectionReset,
            NetError::ConnectionAborted => io::ErrorKind::ConnectionAborted,
            NetError::ConnectionTimedOut => io::ErrorKind::TimedOut,
            NetError::AddressInUse => io::ErrorKind::AddrInUse,
            NetError::NetworkAccessDenied => io::ErrorKind::PermissionDenied,
            NetError::ConnectionFailedTo { source, .. }
            | NetError::NameNotResolvedFor { source, .. }
            | NetError::SocketFailed { source, .. } => source.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
