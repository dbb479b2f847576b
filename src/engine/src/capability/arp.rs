//! ARP responder and cache.

use std::net::Ipv4Addr;

use log::{debug, trace};
use spin::Mutex;
use wirecraft_common::SimError;

use crate::addressing::MacAddress;
use crate::bimap::BidirectionalMap;
use crate::device::NetworkDevice;
use crate::osi::ArpPacket;
use crate::requests;

/// Answers ARP requests for the device's own address and caches every
/// sender it hears from.
#[derive(Debug, Default)]
pub struct ArpCapability {
    table: Mutex<BidirectionalMap<Ipv4Addr, MacAddress>>,
}

impl ArpCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, device: &NetworkDevice, _source: &NetworkDevice, packet: ArpPacket) -> Option<ArpPacket> {
        // Learn from requests and replies alike.
        self.insert(packet.sender_ip, packet.sender_mac);

        let own_ip = device.ip_address()?;
        if packet.target_ip != own_ip {
            trace!("{}: ARP for {} is not for us", device, packet.target_ip);
            return None;
        }
        debug!("{}: answering ARP from {}", device, packet.sender_ip);
        Some(packet.reply(device.mac_address(), own_ip))
    }

    /// MAC address of `target`, asking the network on a cache miss.
    ///
    /// `Ok(None)` means nobody answered. Errors only come from a device that
    /// cannot send requests at all, or from a target behind a gateway.
    pub fn resolve_mac(&self, device: &NetworkDevice, target: Ipv4Addr) -> Result<Option<MacAddress>, SimError> {
        if let Some(mac) = self.lookup(target) {
            return Ok(Some(mac));
        }
        requests::send_arp_request(device, target)?;
        Ok(self.lookup(target))
    }

    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddress> {
        self.table.lock().get(&ip).copied()
    }

    /// Reverse lookup.
    pub fn ip_for(&self, mac: &MacAddress) -> Option<Ipv4Addr> {
        self.table.lock().get_by_value(mac).copied()
    }

    pub fn insert(&self, ip: Ipv4Addr, mac: MacAddress) {
        self.table.lock().set(ip, mac);
    }

    /// Snapshot of the cache, ordered by address.
    pub fn entries(&self) -> Vec<(Ipv4Addr, MacAddress)> {
        let mut entries: Vec<_> = self.table.lock().iter().map(|(ip, mac)| (*ip, *mac)).collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}
