use log::debug;

use crate::device::NetworkDevice;
use crate::osi::{IcmpMessage, IcmpType};

/// Echo responder.
#[derive(Debug, Default)]
pub struct IcmpCapability;

impl IcmpCapability {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, device: &NetworkDevice, source: &NetworkDevice, message: IcmpMessage) -> Option<IcmpMessage> {
        match message.kind {
            IcmpType::EchoRequest => Some(IcmpMessage::echo_reply()),
            IcmpType::EchoReply => {
                debug!("{}: echo reply via {}", device, source.mac_address());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::MacAddress;

    #[test]
    fn test_echo() {
        let device = NetworkDevice::host(MacAddress::new([0xaa; 6]));
        let icmp = IcmpCapability::new();
        assert_eq!(
            icmp.handle(&device, &device, IcmpMessage::echo_request()),
            Some(IcmpMessage::echo_reply())
        );
        assert_eq!(icmp.handle(&device, &device, IcmpMessage::echo_reply()), None);
    }
}
