//! IPv4 host handling.

use std::net::Ipv4Addr;

use log::{trace, warn};

use crate::device::NetworkDevice;
use crate::osi::{Ipv4Message, Ipv4Packet, Message};

/// Gives the device an address and delivers packets sent to it.
#[derive(Debug, Clone, Copy)]
pub struct Ipv4Capability {
    ip_address: Ipv4Addr,
}

impl Ipv4Capability {
    pub fn new(ip_address: Ipv4Addr) -> Self {
        Self { ip_address }
    }

    pub fn ip_address(&self) -> Ipv4Addr {
        self.ip_address
    }

    pub fn handle(&self, device: &NetworkDevice, source: &NetworkDevice, packet: Ipv4Packet) -> Option<Ipv4Packet> {
        if packet.destination_ip != self.ip_address {
            trace!("{}: packet for {} is not for us", device, packet.destination_ip);
            return None;
        }

        let response = device.dispatch(source, Message::from(packet.payload.clone()))?;
        match Ipv4Message::try_from(response) {
            Ok(payload) => Some(packet.reply(payload)),
            Err(other) => {
                warn!("{}: cannot put {} in an IPv4 packet", device, other.kind());
                None
            }
        }
    }
}
