//! Wirecraft protocol-simulation engine.
//!
//! Simulates Ethernet, ARP, IPv4 and ICMP between in-memory devices.
//! Transmission is a synchronous call into the neighbor; the reply is the
//! call's return value.
//!
//! # Architecture
//!
//! - `addressing`: MAC addresses
//! - `osi`: protocol data units, one closed enum per layer
//! - `bimap`: one-to-one two-way map backing every lookup table
//! - `routing`: static routing table with first-match lookup
//! - `capability`: per-layer protocol handlers bound to a device
//! - `device`: simulated node, ports and message dispatch
//! - `requests`: ping and ARP requests originated by a device
//! - `config`: simulation settings
//! - `topology`: device graph built from persisted rows
//! - `checks`: level completion checks

pub mod addressing;
pub mod bimap;
pub mod capability;
pub mod checks;
pub mod config;
pub mod device;
pub mod osi;
pub mod requests;
pub mod routing;
pub mod topology;

pub use addressing::MacAddress;
pub use bimap::BidirectionalMap;
pub use capability::{
    ArpCapability, Capability, CapabilityVariant, EthernetCapability, IcmpCapability, Ipv4Capability,
    Layer2Switching, RoutingCapability,
};
pub use checks::{evaluate_all, Check, CheckFailure, CheckOutcome};
pub use config::SimulationConfig;
pub use device::{NetworkDevice, MAX_TRAVERSAL_DEPTH};
pub use requests::{send_arp_request, send_ping, send_ping_with_ttl, DEFAULT_TTL};
pub use routing::{PortNumber, Route, RoutingTable};
pub use topology::{CableRecord, DeviceRecord, Topology};

pub use wirecraft_common::{CapabilityKind, CapabilitySet, DeviceKind, SimError, TopologyError};
