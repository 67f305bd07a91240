//! 18-byte peer endpoint descriptor: 16-byte IPv6 address + little-endian port.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr, SocketAddrV6};

pub const ENDPOINT_SIZE: usize = 18;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerEndpoint {
    pub ip: Ipv6Addr,
    pub port: u16,
}

impl Default for PeerEndpoint {
    fn default() -> Self {
        Self {
            ip: Ipv6Addr::UNSPECIFIED,
            port: 0,
        }
    }
}

impl PeerEndpoint {
    pub fn new(ip: Ipv6Addr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn from_bytes(bytes: &[u8; ENDPOINT_SIZE]) -> Self {
        let mut ip = [0u8; 16];
        ip.copy_from_slice(&bytes[..16]);
        Self {
            ip: Ipv6Addr::from(ip),
            port: u16::from_le_bytes([bytes[16], bytes[17]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; ENDPOINT_SIZE] {
        let mut out = [0u8; ENDPOINT_SIZE];
        out[..16].copy_from_slice(&self.ip.octets());
        out[16..].copy_from_slice(&self.port.to_le_bytes());
        out
    }

    /// The all-zero wildcard (`[::]:0`), used to pad keepalive lists.
    pub fn is_wildcard(&self) -> bool {
        self.ip.is_unspecified()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        match self.ip.to_ipv4_mapped() {
            Some(v4) => SocketAddr::new(IpAddr::V4(v4), self.port),
            None => SocketAddr::V6(SocketAddrV6::new(self.ip, self.port, 0, 0)),
        }
    }
}

impl From<SocketAddr> for PeerEndpoint {
    fn from(addr: SocketAddr) -> Self {
        let ip = match addr.ip() {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        };
        Self {
            ip,
            port: addr.port(),
        }
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}
