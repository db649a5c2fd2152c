//! IP address validation functions

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Which address families a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpProtocol {
    #[default]
    Both,
    V4,
    V6,
}

/// Parses an address restricted to the given protocol family
pub fn parse_ip(value: &str, protocol: IpProtocol) -> Option<IpAddr> {
    match protocol {
        IpProtocol::Both => value.parse::<IpAddr>().ok(),
        IpProtocol::V4 => value.parse::<Ipv4Addr>().ok().map(IpAddr::V4),
        IpProtocol::V6 => value.parse::<Ipv6Addr>().ok().map(IpAddr::V6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_families() {
        assert!(parse_ip("192.168.0.1", IpProtocol::Both).is_some());
        assert!(parse_ip("::1", IpProtocol::Both).is_some());
        assert!(parse_ip("256.1.1.1", IpProtocol::Both).is_none());
        assert!(parse_ip("localhost", IpProtocol::Both).is_none());
    }

    #[test]
    fn test_v4_only() {
        assert!(parse_ip("10.0.0.1", IpProtocol::V4).is_some());
        assert!(parse_ip("2001:db8::1", IpProtocol::V4).is_none());
    }

    #[test]
    fn test_v6_only() {
        assert!(parse_ip("2001:db8::1", IpProtocol::V6).is_some());
        assert!(parse_ip("10.0.0.1", IpProtocol::V6).is_none());
    }
}
