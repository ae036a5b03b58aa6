//! OSC sink configuration

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Default destination port
pub const DEFAULT_OSC_PORT: u16 = 5005;

/// OSC sink options
#[derive(Debug, Clone)]
pub struct OscConfig {
    /// Where messages are sent
    pub target: SocketAddr,

    /// Local address of the sending socket
    pub bind_addr: SocketAddr,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            target: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_OSC_PORT),
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        }
    }
}

impl OscConfig {
    /// Create a config sending to `ip:port`
    pub fn with_target(ip: IpAddr, port: u16) -> Self {
        Self::default().target(SocketAddr::new(ip, port))
    }

    /// Set the destination
    ///
    /// An IPv6 destination also switches the local socket to IPv6.
    pub fn target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        if target.is_ipv6() && self.bind_addr.is_ipv4() {
            self.bind_addr = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0);
        }
        self
    }

    /// Set the local address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OscConfig::default();

        assert_eq!(config.target.to_string(), "127.0.0.1:5005");
        assert_eq!(config.bind_addr.port(), 0);
    }

    #[test]
    fn test_ipv6_target_switches_bind_family() {
        let config = OscConfig::with_target("::1".parse().unwrap(), 9000);

        assert_eq!(config.target.port(), 9000);
        assert!(config.bind_addr.is_ipv6());
    }
}
