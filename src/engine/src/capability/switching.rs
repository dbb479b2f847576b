//! Learning Layer-2 switch.
//!
//! The switch records which port each source MAC was seen on, forwards
//! known unicast to that port and floods the rest.
//!
//! Flooding is first-responder: neighbors are tried in ascending port order
//! and the first one that answers wins, the others are never reached. This
//! models a single reply path and is wrong for networks with several.

use log::{debug, trace};
use spin::Mutex;

use crate::addressing::MacAddress;
use crate::bimap::BidirectionalMap;
use crate::device::NetworkDevice;
use crate::osi::EthernetFrame;
use crate::routing::PortNumber;

#[derive(Debug, Default)]
pub struct Layer2Switching {
    mac_table: Mutex<BidirectionalMap<MacAddress, PortNumber>>,
}

impl Layer2Switching {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(
        &self,
        device: &NetworkDevice,
        source: &NetworkDevice,
        frame: EthernetFrame,
    ) -> Option<EthernetFrame> {
        let ingress = device.port_of(source);
        if let Some(port) = ingress {
            self.learn(device, frame.source_mac, port);
        }

        if frame.destination_mac.is_broadcast() {
            return self.flood(device, ingress, frame);
        }

        let known = self.port_for(&frame.destination_mac);
        if known.is_some() && known == ingress {
            trace!("{}: {} is behind the ingress port, dropping", device, frame.destination_mac);
            return None;
        }
        match known.and_then(|port| device.neighbor_on(port)) {
            Some(next) => {
                trace!("{}: forwarding {} to known port", device, frame.destination_mac);
                next.handle_request(device, frame)
            }
            None => self.flood(device, ingress, frame),
        }
    }

    /// Offer `frame` to every neighbor except the one on `ingress`.
    fn flood(
        &self,
        device: &NetworkDevice,
        ingress: Option<PortNumber>,
        frame: EthernetFrame,
    ) -> Option<EthernetFrame> {
        trace!("{}: flooding frame for {}", device, frame.destination_mac);
        for (port, neighbor) in device.neighbors() {
            if Some(port) == ingress {
                continue;
            }
            if let Some(response) = neighbor.handle_request(device, frame.clone()) {
                self.mac_table.lock().set(response.source_mac, port);
                return Some(response);
            }
        }
        None
    }

    fn learn(&self, device: &NetworkDevice, mac: MacAddress, port: PortNumber) {
        let mut table = self.mac_table.lock();
        if !table.contains_key(&mac) {
            debug!("{}: learned {} on port {}", device, mac, port);
            table.set(mac, port);
        }
    }

    /// The port `mac` was last learned on.
    pub fn port_for(&self, mac: &MacAddress) -> Option<PortNumber> {
        self.mac_table.lock().get(mac).copied()
    }

    /// Snapshot of the MAC table, ordered by port.
    pub fn entries(&self) -> Vec<(MacAddress, PortNumber)> {
        let mut entries: Vec<_> = self
            .mac_table
            .lock()
            .iter()
            .map(|(mac, port)| (*mac, *port))
            .collect();
        entries.sort_by_key(|(_, port)| *port);
        entries
    }
}
