//! System-wide error types for Wirecraft.
//!
//! Network conditions (no route, no ARP answer, wrong destination) are never
//! errors: they show up as `None`/`false`. These types only cover mistakes in
//! how a simulation was put together.

use core::fmt;
use std::net::Ipv4Addr;

use crate::capability::{CapabilityKind, CapabilitySet, DeviceKind};

/// Misconfiguration of a simulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A send operation ran on a device lacking required capabilities.
    MissingCapabilities(CapabilitySet),
    /// ARP was asked to resolve a target that is only reachable through a
    /// gateway.
    GatewayNotAllowed {
        /// Address that was being resolved.
        target: Ipv4Addr,
        /// Gateway of the matching route.
        gateway: Ipv4Addr,
    },
    /// A capability was bound to a device kind that cannot carry it.
    IncompatibleCapability {
        /// The rejected capability.
        capability: CapabilityKind,
        /// The kind of the device it was offered to.
        device: DeviceKind,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::MissingCapabilities(missing) => {
                write!(f, "missing required capabilities: {}", missing)
            }
            SimError::GatewayNotAllowed { target, gateway } => write!(
                f,
                "ARP requests must target a directly connected device, but {} is routed through gateway {}",
                target, gateway
            ),
            SimError::IncompatibleCapability { capability, device } => write!(
                f,
                "capability {} is not compatible with device type {}",
                capability, device
            ),
        }
    }
}

impl std::error::Error for SimError {}

/// Errors raised while turning persisted rows into a device graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// A cable references a device id that has no row.
    UnknownDevice(u32),
    /// Two rows share the same device id.
    DuplicateDevice(u32),
    /// A device row carries an unparsable IPv4 address.
    InvalidAddress {
        /// The offending device id.
        device: u32,
        /// The raw value from the row.
        value: String,
    },
    /// The rows themselves could not be decoded.
    Parse(String),
    /// Building a device failed.
    Device(SimError),
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::UnknownDevice(id) => write!(f, "cable references unknown device {}", id),
            TopologyError::DuplicateDevice(id) => write!(f, "device {} is defined twice", id),
            TopologyError::InvalidAddress { device, value } => {
                write!(f, "device {} has an invalid IPv4 address {:?}", device, value)
            }
            TopologyError::Parse(msg) => write!(f, "invalid topology input: {}", msg),
            TopologyError::Device(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for TopologyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TopologyError::Device(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SimError> for TopologyError {
    fn from(err: SimError) -> Self {
        TopologyError::Device(err)
    }
}
