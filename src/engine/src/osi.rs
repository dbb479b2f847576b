//! Protocol data units exchanged between simulated devices.
//!
//! Each layer is a closed enum of typed records. Nothing here is encoded to
//! bytes: a frame travels between devices as a value.

use core::fmt;
use std::net::Ipv4Addr;

use crate::addressing::MacAddress;

/// Layer-2 frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EthernetFrame {
    /// Receiver, possibly [`MacAddress::broadcast`].
    pub destination_mac: MacAddress,
    /// Sender.
    pub source_mac: MacAddress,
    /// Encapsulated packet.
    pub payload: Packet,
}

/// Anything an Ethernet frame can carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Packet {
    Arp(ArpPacket),
    Ipv4(Ipv4Packet),
}

/// ARP operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ArpOpcode {
    Request = 1,
    Reply = 2,
}

/// ARP request or reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArpPacket {
    pub opcode: ArpOpcode,
    pub sender_mac: MacAddress,
    pub sender_ip: Ipv4Addr,
    /// Unknown (`None`) on requests.
    pub target_mac: Option<MacAddress>,
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    /// A request asking who owns `target_ip`.
    pub fn request(sender_mac: MacAddress, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        ArpPacket {
            opcode: ArpOpcode::Request,
            sender_mac,
            sender_ip,
            target_mac: None,
            target_ip,
        }
    }

    /// The reply to this packet, announcing `mac` as the owner of `ip`.
    pub fn reply(&self, mac: MacAddress, ip: Ipv4Addr) -> Self {
        ArpPacket {
            opcode: ArpOpcode::Reply,
            sender_mac: mac,
            sender_ip: ip,
            target_mac: Some(self.sender_mac),
            target_ip: self.sender_ip,
        }
    }
}

/// IPv4 datagram.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ipv4Packet {
    pub ttl: u8,
    pub source_ip: Ipv4Addr,
    pub destination_ip: Ipv4Addr,
    pub payload: Ipv4Message,
}

impl Ipv4Packet {
    /// A reply to this packet carrying `payload`.
    ///
    /// Addresses are swapped. The TTL is copied unchanged: nothing in the
    /// simulation decrements it.
    pub fn reply(&self, payload: Ipv4Message) -> Self {
        Ipv4Packet {
            ttl: self.ttl,
            source_ip: self.destination_ip,
            destination_ip: self.source_ip,
            payload,
        }
    }
}

/// Anything an IPv4 packet can carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ipv4Message {
    Icmp(IcmpMessage),
    Udp(UdpDatagram),
    Tcp(TcpSegment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IcmpType {
    EchoReply = 0,
    EchoRequest = 8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IcmpMessage {
    pub kind: IcmpType,
    pub code: u8,
}

impl IcmpMessage {
    pub const fn echo_request() -> Self {
        IcmpMessage {
            kind: IcmpType::EchoRequest,
            code: 0,
        }
    }

    pub const fn echo_reply() -> Self {
        IcmpMessage {
            kind: IcmpType::EchoReply,
            code: 0,
        }
    }
}

/// UDP datagram. No capability handles it yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UdpDatagram {
    pub source_port: u16,
    pub destination_port: u16,
    pub payload: Vec<u8>,
}

/// TCP segment. No capability handles it yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TcpSegment {
    pub source_port: u16,
    pub destination_port: u16,
    pub payload: Vec<u8>,
}

/// Tag of a [`Message`] variant, used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKind {
    Ethernet,
    Arp,
    Ipv4,
    Icmp,
    Udp,
    Tcp,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Ethernet => "EthernetFrame",
            MessageKind::Arp => "ArpPacket",
            MessageKind::Ipv4 => "Ipv4Packet",
            MessageKind::Icmp => "IcmpMessage",
            MessageKind::Udp => "UdpDatagram",
            MessageKind::Tcp => "TcpSegment",
        };
        f.write_str(name)
    }
}

/// Any protocol data unit, at any layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Message {
    Ethernet(EthernetFrame),
    Arp(ArpPacket),
    Ipv4(Ipv4Packet),
    Icmp(IcmpMessage),
    Udp(UdpDatagram),
    Tcp(TcpSegment),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Ethernet(_) => MessageKind::Ethernet,
            Message::Arp(_) => MessageKind::Arp,
            Message::Ipv4(_) => MessageKind::Ipv4,
            Message::Icmp(_) => MessageKind::Icmp,
            Message::Udp(_) => MessageKind::Udp,
            Message::Tcp(_) => MessageKind::Tcp,
        }
    }
}

impl From<EthernetFrame> for Message {
    fn from(frame: EthernetFrame) -> Self {
        Message::Ethernet(frame)
    }
}

impl From<Packet> for Message {
    fn from(packet: Packet) -> Self {
        match packet {
            Packet::Arp(arp) => Message::Arp(arp),
            Packet::Ipv4(ip) => Message::Ipv4(ip),
        }
    }
}

impl From<Ipv4Message> for Message {
    fn from(message: Ipv4Message) -> Self {
        match message {
            Ipv4Message::Icmp(icmp) => Message::Icmp(icmp),
            Ipv4Message::Udp(udp) => Message::Udp(udp),
            Ipv4Message::Tcp(tcp) => Message::Tcp(tcp),
        }
    }
}

impl TryFrom<Message> for EthernetFrame {
    type Error = Message;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        match message {
            Message::Ethernet(frame) => Ok(frame),
            other => Err(other),
        }
    }
}

impl TryFrom<Message> for Packet {
    type Error = Message;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        match message {
            Message::Arp(arp) => Ok(Packet::Arp(arp)),
            Message::Ipv4(ip) => Ok(Packet::Ipv4(ip)),
            other => Err(other),
        }
    }
}

impl TryFrom<Message> for Ipv4Message {
    type Error = Message;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        match message {
            Message::Icmp(icmp) => Ok(Ipv4Message::Icmp(icmp)),
            Message::Udp(udp) => Ok(Ipv4Message::Udp(udp)),
            Message::Tcp(tcp) => Ok(Ipv4Message::Tcp(tcp)),
            other => Err(other),
        }
    }
}
