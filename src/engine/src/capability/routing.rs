//! Outgoing route selection.

use std::net::Ipv4Addr;

use log::debug;
use smoltcp::wire::Ipv4Cidr;
use spin::Mutex;

use crate::device::NetworkDevice;
use crate::routing::{PortNumber, Route, RoutingTable};

/// Static routing table of a device. Has no inbound role.
#[derive(Debug, Default)]
pub struct RoutingCapability {
    table: Mutex<RoutingTable>,
}

impl RoutingCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: RoutingTable) -> Self {
        Self {
            table: Mutex::new(table),
        }
    }

    pub fn add_route(&self, destination: Ipv4Cidr, gateway: Option<Ipv4Addr>, interface: PortNumber) {
        self.table.lock().add_route(destination, gateway, interface);
    }

    /// First route matching `target`.
    pub fn resolve_route(&self, device: &NetworkDevice, target: Ipv4Addr) -> Option<Route> {
        let route = self.table.lock().get_route(target).copied();
        match &route {
            Some(route) => debug!("{}: route to {}: {}", device, target, route),
            None => debug!("{}: no route to {}", device, target),
        }
        route
    }

    pub fn routes(&self) -> Vec<Route> {
        self.table.lock().routes().to_vec()
    }
}
