//! Traffic originated by a device.
//!
//! Both operations follow the same path: pick a route, find the next hop
//! on the route's interface and hand it a frame. The answer, if any, comes
//! back as the return value of that call.

use std::net::Ipv4Addr;

use log::{debug, info, trace};
use wirecraft_common::{CapabilitySet, SimError};

use crate::addressing::MacAddress;
use crate::capability::{ArpCapability, RoutingCapability};
use crate::device::NetworkDevice;
use crate::osi::{ArpOpcode, ArpPacket, EthernetFrame, IcmpMessage, IcmpType, Ipv4Message, Ipv4Packet, Packet};

/// TTL of packets built by [`send_ping`].
pub const DEFAULT_TTL: u8 = 64;

/// Capabilities `device` lacks to originate traffic.
fn require_sender(device: &NetworkDevice) -> Result<(), SimError> {
    let missing = CapabilitySet::SENDER.difference(device.capability_set());
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SimError::MissingCapabilities(missing))
    }
}

/// The routing and ARP capabilities plus own address of a sender.
fn sender_parts(device: &NetworkDevice) -> Result<(&RoutingCapability, &ArpCapability, Ipv4Addr), SimError> {
    require_sender(device)?;
    match (
        device.capability::<RoutingCapability>(),
        device.capability::<ArpCapability>(),
        device.ip_address(),
    ) {
        (Some(routing), Some(arp), Some(ip)) => Ok((routing, arp, ip)),
        _ => Err(SimError::MissingCapabilities(CapabilitySet::SENDER)),
    }
}

/// Broadcast an ARP request for `target` and cache the answer.
///
/// The target has to be on a directly attached network: a route through a
/// gateway is a configuration error. No route, nothing plugged into the
/// interface or no reply all give `Ok(None)`.
pub fn send_arp_request(source: &NetworkDevice, target: Ipv4Addr) -> Result<Option<MacAddress>, SimError> {
    let (routing, arp, source_ip) = sender_parts(source)?;

    let Some(route) = routing.resolve_route(source, target) else {
        return Ok(None);
    };
    if let Some(gateway) = route.gateway {
        return Err(SimError::GatewayNotAllowed { target, gateway });
    }
    let Some(next_hop) = source.neighbor_on(route.interface) else {
        debug!("{}: nothing connected on port {}", source, route.interface);
        return Ok(None);
    };

    let frame = EthernetFrame {
        destination_mac: MacAddress::broadcast(),
        source_mac: source.mac_address(),
        payload: Packet::Arp(ArpPacket::request(source.mac_address(), source_ip, target)),
    };
    trace!("{}: who has {}?", source, target);

    match next_hop.handle_request(source, frame) {
        Some(EthernetFrame {
            payload: Packet::Arp(reply),
            ..
        }) if reply.opcode == ArpOpcode::Reply && reply.sender_ip == target => {
            arp.insert(reply.sender_ip, reply.sender_mac);
            debug!("{}: {} is at {}", source, target, reply.sender_mac);
            Ok(Some(reply.sender_mac))
        }
        _ => {
            debug!("{}: no ARP reply for {}", source, target);
            Ok(None)
        }
    }
}

/// Send an ICMP echo request to `target` and report whether it answered.
///
/// Nothing in the simulation forwards IPv4, so when the route goes through
/// a gateway the echo is addressed to the gateway itself and its answer
/// counts as success.
pub fn send_ping(source: &NetworkDevice, target: Ipv4Addr) -> Result<bool, SimError> {
    send_ping_with_ttl(source, target, DEFAULT_TTL)
}

/// [`send_ping`] with an explicit TTL.
pub fn send_ping_with_ttl(source: &NetworkDevice, target: Ipv4Addr, ttl: u8) -> Result<bool, SimError> {
    let (routing, arp, source_ip) = sender_parts(source)?;

    let Some(route) = routing.resolve_route(source, target) else {
        return Ok(false);
    };
    let destination_ip = route.gateway.unwrap_or(target);
    let Some(destination_mac) = arp.resolve_mac(source, destination_ip)? else {
        debug!("{}: could not resolve {}", source, destination_ip);
        return Ok(false);
    };
    let Some(next_hop) = source.neighbor_on(route.interface) else {
        debug!("{}: nothing connected on port {}", source, route.interface);
        return Ok(false);
    };

    let frame = EthernetFrame {
        destination_mac,
        source_mac: source.mac_address(),
        payload: Packet::Ipv4(Ipv4Packet {
            ttl,
            source_ip,
            destination_ip,
            payload: Ipv4Message::Icmp(IcmpMessage::echo_request()),
        }),
    };

    let answered = matches!(
        next_hop.handle_request(source, frame),
        Some(EthernetFrame {
            payload: Packet::Ipv4(Ipv4Packet {
                source_ip: reply_ip,
                payload: Ipv4Message::Icmp(IcmpMessage {
                    kind: IcmpType::EchoReply,
                    ..
                }),
                ..
            }),
            ..
        }) if reply_ip == destination_ip
    );
    info!("{}: ping {} {}", source, target, if answered { "ok" } else { "failed" });
    Ok(answered)
}
