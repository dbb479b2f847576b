//! Device graph built from persisted rows.
//!
//! A level is stored as a list of device rows and a list of cable rows.
//! [`Topology::build`] turns them into connected [`NetworkDevice`]s with the
//! capability set their type calls for.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use wirecraft_common::{DeviceKind, SimError, TopologyError};

use crate::addressing::MacAddress;
use crate::capability::{
    ArpCapability, Capability, EthernetCapability, IcmpCapability, Ipv4Capability, Layer2Switching,
    RoutingCapability,
};
use crate::config::SimulationConfig;
use crate::device::NetworkDevice;
use crate::requests;
use crate::routing::PortNumber;

/// A device as persisted by the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub ip: Option<String>,
}

/// A cable between two device ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableRecord {
    pub device_id_1: u32,
    pub port_1: PortNumber,
    pub device_id_2: u32,
    pub port_2: PortNumber,
}

#[derive(Deserialize)]
struct Rows {
    #[serde(default)]
    devices: Vec<DeviceRecord>,
    #[serde(default)]
    cables: Vec<CableRecord>,
}

/// Connected devices of one level, keyed by row id.
#[derive(Debug)]
pub struct Topology {
    config: SimulationConfig,
    records: BTreeMap<u32, DeviceRecord>,
    devices: BTreeMap<u32, Arc<NetworkDevice>>,
}

impl Topology {
    /// Build every device, then plug in every cable.
    pub fn build(
        devices: &[DeviceRecord],
        cables: &[CableRecord],
        config: &SimulationConfig,
    ) -> Result<Self, TopologyError> {
        let mut records = BTreeMap::new();
        let mut built = BTreeMap::new();

        for record in devices {
            if records.contains_key(&record.id) {
                return Err(TopologyError::DuplicateDevice(record.id));
            }
            let device = build_device(record, config)?;
            debug!("built {} as {}", record.name, device);
            built.insert(record.id, Arc::new(device));
            records.insert(record.id, record.clone());
        }

        for cable in cables {
            let a = built
                .get(&cable.device_id_1)
                .ok_or(TopologyError::UnknownDevice(cable.device_id_1))?;
            let b = built
                .get(&cable.device_id_2)
                .ok_or(TopologyError::UnknownDevice(cable.device_id_2))?;
            a.add_connection(cable.port_1, b, cable.port_2);
        }

        info!("topology ready: {} devices, {} cables", built.len(), cables.len());
        Ok(Self {
            config: *config,
            records,
            devices: built,
        })
    }

    /// Build from a JSON object `{"devices": [...], "cables": [...]}`.
    pub fn from_json(json: &str, config: &SimulationConfig) -> Result<Self, TopologyError> {
        let rows: Rows = serde_json::from_str(json).map_err(|err| TopologyError::Parse(err.to_string()))?;
        Self::build(&rows.devices, &rows.cables, config)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn device(&self, id: u32) -> Option<&Arc<NetworkDevice>> {
        self.devices.get(&id)
    }

    pub fn record(&self, id: u32) -> Option<&DeviceRecord> {
        self.records.get(&id)
    }

    /// Id of the first row named `name`.
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.records
            .values()
            .find(|record| record.name == name)
            .map(|record| record.id)
    }

    pub fn device_by_name(&self, name: &str) -> Option<&Arc<NetworkDevice>> {
        self.id_of(name).and_then(|id| self.device(id))
    }

    /// Rows in id order.
    pub fn records(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.records.values()
    }

    /// Devices in id order.
    pub fn devices(&self) -> impl Iterator<Item = (u32, &Arc<NetworkDevice>)> {
        self.devices.iter().map(|(id, device)| (*id, device))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Ping `target` from the device named `name`. An unknown name is a
    /// failed ping, not an error.
    pub fn ping(&self, name: &str, target: Ipv4Addr) -> Result<bool, SimError> {
        match self.device_by_name(name) {
            Some(device) => requests::send_ping_with_ttl(device, target, self.config.initial_ttl),
            None => Ok(false),
        }
    }
}

fn build_device(record: &DeviceRecord, config: &SimulationConfig) -> Result<NetworkDevice, TopologyError> {
    let mut device = NetworkDevice::new(MacAddress::from_device_id(record.id), record.kind);
    let mut capabilities: Vec<Capability> = Vec::new();

    if let Some(ip) = record.ip.as_deref() {
        let ip: Ipv4Addr = ip.parse().map_err(|_| TopologyError::InvalidAddress {
            device: record.id,
            value: ip.to_string(),
        })?;
        capabilities.push(Ipv4Capability::new(ip).into());
    }

    match record.kind {
        DeviceKind::Switch => capabilities.push(Layer2Switching::new().into()),
        DeviceKind::Host => {
            let routing = RoutingCapability::new();
            routing.add_route(config.default_network, None, config.default_interface);
            capabilities.push(EthernetCapability::new().into());
            capabilities.push(routing.into());
            capabilities.push(IcmpCapability::new().into());
            capabilities.push(ArpCapability::new().into());
        }
    }

    device.add_capabilities(capabilities)?;
    Ok(device)
}
