//! Static routing table.

use core::fmt;
use std::net::Ipv4Addr;

use smoltcp::wire::Ipv4Cidr;

/// A port number on a device. Interfaces are ports in this model.
pub type PortNumber = u16;

/// A single entry of a [`RoutingTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Network reached through this route.
    pub destination: Ipv4Cidr,
    /// Next hop, when the destination is not directly attached.
    pub gateway: Option<Ipv4Addr>,
    /// Outgoing port.
    pub interface: PortNumber,
}

impl Route {
    /// Whether `target` falls inside this route's destination network.
    pub fn matches(&self, target: Ipv4Addr) -> bool {
        self.destination.contains_addr(&target)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.destination)?;
        if let Some(gateway) = self.gateway {
            write!(f, " via {}", gateway)?;
        }
        write!(f, " dev {}", self.interface)
    }
}

/// Ordered list of routes with first-match lookup.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    table: Vec<Route>,
}

impl RoutingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Earlier routes take precedence.
    pub fn add_route(&mut self, destination: Ipv4Cidr, gateway: Option<Ipv4Addr>, interface: PortNumber) {
        self.table.push(Route {
            destination,
            gateway,
            interface,
        });
    }

    /// The first route, in insertion order, whose network contains `target`.
    ///
    /// This is first-match, not longest-prefix: a broad route added before a
    /// narrow one shadows it.
    pub fn get_route(&self, target: Ipv4Addr) -> Option<&Route> {
        self.table.iter().find(|route| route.matches(target))
    }

    /// Every route, in lookup order.
    pub fn routes(&self) -> &[Route] {
        &self.table
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table has no route at all.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Error returned by [`parse_cidr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrParseError(String);

impl fmt::Display for CidrParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid IPv4 network {:?}", self.0)
    }
}

impl std::error::Error for CidrParseError {}

/// Parse `a.b.c.d/len`. A bare address is treated as a `/32`.
pub fn parse_cidr(s: &str) -> Result<Ipv4Cidr, CidrParseError> {
    if s.contains('/') {
        return s.parse::<Ipv4Cidr>().map_err(|()| CidrParseError(s.to_string()));
    }
    let addr: Ipv4Addr = s.parse().map_err(|_| CidrParseError(s.to_string()))?;
    Ok(Ipv4Cidr::new(addr, 32))
}
