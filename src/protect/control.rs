//! Per-socket protection hook.
//!
//! A [`Control`] runs on every raw socket a dialer or listener creates,
//! after the socket exists and before it is bound or connected.

use super::{Protector, RawSocketHandle};
use crate::base::neterror::NetError;
use crate::socket::network::Network;
use std::fmt;
use std::os::fd::AsRawFd;
use std::sync::Arc;

/// Socket-creation hook that protects each socket from VPN capture.
///
/// Protection is best-effort: a refusal is reported through `tracing` and the
/// socket is still used.
#[derive(Clone)]
pub struct Control {
    protector: Arc<dyn Protector>,
}

impl Control {
    pub fn new(protector: Arc<dyn Protector>) -> Self {
        Self { protector }
    }

    /// Protects a raw handle, returning [`NetError::ProtectionFailed`] if the
    /// protector refused.
    pub fn protect(&self, network: Network, fd: RawSocketHandle) -> Result<(), NetError> {
        if self.protector.protect(fd) {
            tracing::trace!(network = %network, fd, "socket protected");
            Ok(())
        } else {
            Err(NetError::ProtectionFailed {
                network: network.as_str(),
                fd,
            })
        }
    }

    /// Runs the hook on a freshly created socket. Never fails the socket.
    pub fn apply<S: AsRawFd>(&self, network: Network, socket: &S) {
        if let Err(e) = self.protect(network, socket.as_raw_fd()) {
            tracing::error!(network = %network, error = %e, "Failed to protect a {} socket", network);
        }
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control").finish_non_exhaustive()
    }
}

/// Builds the socket hook for `protector`; `None` means default, unprotected sockets.
pub fn make_control(protector: Option<Arc<dyn Protector>>) -> Option<Control> {
    protector.map(Control::new)
}
