use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// A network endpoint: an IP address and a port.
///
/// The overlay core never interprets an endpoint beyond equality and
/// IP matching; connection establishment belongs to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    ip: IpAddr,
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint from an IP address and port.
    pub const fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    /// The endpoint's IP address.
    pub const fn ip(&self) -> IpAddr {
        self.ip
    }

    /// The endpoint's port.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// The endpoint as a socket address.
    pub const fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_socket_addr()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_socket_addr().fmt(f)
    }
}
