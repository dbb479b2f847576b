//! Protocol capabilities.
//!
//! A device is a bag of capabilities, each one emulating a single layer.
//! The set is closed: [`Capability`] has one variant per [`CapabilityKind`],
//! and inbound messages are routed to a variant by [`MessageKind`].
//!
//! # Capabilities
//!
//! - `ethernet`: host NIC, accepts frames addressed to the device
//! - `switching`: learning Layer-2 switch
//! - `arp`: ARP responder and IP→MAC cache
//! - `ipv4`: IPv4 host, demuxes to the transport handler
//! - `icmp`: echo replies
//! - `routing`: route lookup for outgoing traffic

pub mod arp;
pub mod ethernet;
pub mod icmp;
pub mod ipv4;
pub mod routing;
pub mod switching;

pub use arp::ArpCapability;
pub use ethernet::EthernetCapability;
pub use icmp::IcmpCapability;
pub use ipv4::Ipv4Capability;
pub use routing::RoutingCapability;
pub use switching::Layer2Switching;

pub use wirecraft_common::capability::{CapabilityKind, CapabilitySet};

use log::warn;

use crate::device::NetworkDevice;
use crate::osi::{Message, MessageKind};

/// A capability bound to a device.
#[derive(Debug)]
pub enum Capability {
    Ethernet(EthernetCapability),
    Switching(Layer2Switching),
    Arp(ArpCapability),
    Ipv4(Ipv4Capability),
    Icmp(IcmpCapability),
    Routing(RoutingCapability),
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Ethernet(_) => CapabilityKind::Ethernet,
            Capability::Switching(_) => CapabilityKind::Switching,
            Capability::Arp(_) => CapabilityKind::Arp,
            Capability::Ipv4(_) => CapabilityKind::Ipv4,
            Capability::Icmp(_) => CapabilityKind::Icmp,
            Capability::Routing(_) => CapabilityKind::Routing,
        }
    }

    /// The message kind this capability receives, if it has an inbound role.
    pub fn handles(&self) -> Option<MessageKind> {
        match self {
            Capability::Ethernet(_) | Capability::Switching(_) => Some(MessageKind::Ethernet),
            Capability::Arp(_) => Some(MessageKind::Arp),
            Capability::Ipv4(_) => Some(MessageKind::Ipv4),
            Capability::Icmp(_) => Some(MessageKind::Icmp),
            Capability::Routing(_) => None,
        }
    }

    /// Process `message` on behalf of `device`, which received it from
    /// `source`. Returns the reply, if any.
    pub fn handle(
        &self,
        device: &NetworkDevice,
        source: &NetworkDevice,
        message: Message,
    ) -> Option<Message> {
        match (self, message) {
            (Capability::Ethernet(cap), Message::Ethernet(frame)) => {
                cap.handle(device, source, frame).map(Message::Ethernet)
            }
            (Capability::Switching(cap), Message::Ethernet(frame)) => {
                cap.handle(device, source, frame).map(Message::Ethernet)
            }
            (Capability::Arp(cap), Message::Arp(packet)) => {
                cap.handle(device, source, packet).map(Message::Arp)
            }
            (Capability::Ipv4(cap), Message::Ipv4(packet)) => {
                cap.handle(device, source, packet).map(Message::Ipv4)
            }
            (Capability::Icmp(cap), Message::Icmp(icmp)) => {
                cap.handle(device, source, icmp).map(Message::Icmp)
            }
            (cap, message) => {
                warn!("{}: {} capability cannot handle {}", device, cap.kind(), message.kind());
                None
            }
        }
    }
}

/// Typed access to one [`Capability`] variant.
pub trait CapabilityVariant: Into<Capability> {
    const KIND: CapabilityKind;

    fn from_capability(capability: &Capability) -> Option<&Self>;
}

macro_rules! capability_variant {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Capability {
            fn from(capability: $ty) -> Self {
                Capability::$variant(capability)
            }
        }

        impl CapabilityVariant for $ty {
            const KIND: CapabilityKind = CapabilityKind::$variant;

            fn from_capability(capability: &Capability) -> Option<&Self> {
                match capability {
                    Capability::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

capability_variant!(EthernetCapability, Ethernet);
capability_variant!(Layer2Switching, Switching);
capability_variant!(ArpCapability, Arp);
capability_variant!(Ipv4Capability, Ipv4);
capability_variant!(IcmpCapability, Icmp);
capability_variant!(RoutingCapability, Routing);
