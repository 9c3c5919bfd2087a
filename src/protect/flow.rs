//! Per-connection routing decisions.
//!
//! The host decides, for every new flow, whether to drop it, send it over the
//! active network, or hand it to a specific proxy/tunnel. Dialers and
//! listeners in this crate never consult it; it is part of the host boundary.

use std::fmt;

/// Routing tag for a blocked flow.
pub const NET_ID_BLOCK: &str = "block";
/// Routing tag for the active/default network.
pub const NET_ID_ACTIVE: &str = "allow";
/// Owner uid reported when the connection owner could not be determined.
pub const UNKNOWN_UID: i32 = -1;

/// Host policy consulted on new connection setup.
///
/// `source` and `target` are the textual socket addresses of the flow.
/// Returns [`NET_ID_BLOCK`], [`NET_ID_ACTIVE`], or a network identifier.
pub trait Flow: Send + Sync {
    fn on(&self, protocol: i32, uid: i32, source: &str, target: &str) -> String;

    /// Like [`Flow::on`], with the returned tag parsed.
    fn decide(&self, protocol: i32, uid: i32, source: &str, target: &str) -> RoutingDecision {
        RoutingDecision::from_net_id(&self.on(protocol, uid, source, target))
    }
}

/// Parsed result of [`Flow::on`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutingDecision {
    /// Drop the flow.
    Block,
    /// Forward over the active network.
    Allow,
    /// Forward to the proxy or tunnel with this id.
    Network(String),
}

impl RoutingDecision {
    pub fn from_net_id(net_id: &str) -> Self {
        match net_id {
            NET_ID_BLOCK => RoutingDecision::Block,
            NET_ID_ACTIVE => RoutingDecision::Allow,
            other => RoutingDecision::Network(other.to_string()),
        }
    }

    pub fn as_net_id(&self) -> &str {
        match self {
            RoutingDecision::Block => NET_ID_BLOCK,
            RoutingDecision::Allow => NET_ID_ACTIVE,
            RoutingDecision::Network(id) => id,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, RoutingDecision::Block)
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_net_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PortPolicy;

    impl Flow for PortPolicy {
        fn on(&self, _protocol: i32, uid: i32, _source: &str, target: &str) -> String {
            if uid == UNKNOWN_UID {
                NET_ID_BLOCK.to_string()
            } else if target.ends_with(":53") {
                "wg0".to_string()
            } else {
                NET_ID_ACTIVE.to_string()
            }
        }
    }

    #[test]
    fn test_from_net_id() {
        assert_eq!(RoutingDecision::from_net_id("block"), RoutingDecision::Block);
        assert_eq!(RoutingDecision::from_net_id("allow"), RoutingDecision::Allow);
        assert_eq!(
            RoutingDecision::from_net_id("proxy-1"),
            RoutingDecision::Network("proxy-1".to_string())
        );
    }

    #[test]
    fn test_net_id_display() {
        assert_eq!(RoutingDecision::Block.to_string(), "block");
        assert_eq!(RoutingDecision::Network("wg0".into()).as_net_id(), "wg0");
    }

    #[test]
    fn test_flow_decide() {
        let flow = PortPolicy;
        assert!(flow.decide(6, UNKNOWN_UID, "10.1.0.2:4000", "1.1.1.1:443").is_blocked());
        assert_eq!(
            flow.decide(17, 10123, "10.1.0.2:4000", "1.1.1.1:53"),
            RoutingDecision::Network("wg0".to_string())
        );
        assert_eq!(
            flow.decide(6, 10123, "10.1.0.2:4000", "1.1.1.1:443"),
            RoutingDecision::Allow
        );
    }
}
