//! Host-side Ethernet handling.

use log::{trace, warn};

use crate::device::NetworkDevice;
use crate::osi::{EthernetFrame, Message, Packet};

/// Network interface of an end host.
///
/// Accepts frames sent to the device or to broadcast, hands the payload to
/// whichever capability handles it and wraps the answer in a frame going
/// back to the sender.
#[derive(Debug, Default)]
pub struct EthernetCapability;

impl EthernetCapability {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(
        &self,
        device: &NetworkDevice,
        source: &NetworkDevice,
        frame: EthernetFrame,
    ) -> Option<EthernetFrame> {
        let EthernetFrame {
            destination_mac,
            source_mac,
            payload,
        } = frame;

        if !destination_mac.is_broadcast() && destination_mac != device.mac_address() {
            trace!("{}: ignoring frame for {}", device, destination_mac);
            return None;
        }

        let response = device.dispatch(source, Message::from(payload))?;
        match Packet::try_from(response) {
            Ok(payload) => Some(EthernetFrame {
                destination_mac: source_mac,
                source_mac: device.mac_address(),
                payload,
            }),
            Err(other) => {
                warn!("{}: cannot put {} in a frame", device, other.kind());
                None
            }
        }
    }
}
