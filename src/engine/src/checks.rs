//! Level completion checks.
//!
//! A level is won when every one of its checks passes against the
//! player's topology. Failures carry a message meant for the player.

use core::fmt;
use std::net::Ipv4Addr;

use log::debug;
use serde::{Deserialize, Serialize};
use wirecraft_common::DeviceKind;

use crate::topology::Topology;

/// One condition a level imposes on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    /// A device with this name and type exists.
    DevicePresence {
        name: String,
        #[serde(rename = "type")]
        kind: DeviceKind,
    },
    /// The two named devices are cabled together.
    CableConnection { source: String, destination: String },
    /// A ping from the named device reaches `destination`.
    Ping { source: String, destination: Ipv4Addr },
}

/// Why a check did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFailure {
    pub message: String,
}

impl CheckFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CheckFailure {}

/// Result of one check in [`evaluate_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub check: Check,
    pub passed: bool,
    pub message: Option<String>,
}

impl Check {
    pub fn evaluate(&self, topology: &Topology) -> Result<(), CheckFailure> {
        match self {
            Check::DevicePresence { name, kind } => device_presence(topology, name, *kind),
            Check::CableConnection { source, destination } => cable_connection(topology, source, destination),
            Check::Ping { source, destination } => ping(topology, source, *destination),
        }
    }
}

fn device_presence(topology: &Topology, name: &str, kind: DeviceKind) -> Result<(), CheckFailure> {
    match topology.records().find(|record| record.name == name) {
        Some(record) if record.kind == kind => Ok(()),
        Some(record) => Err(CheckFailure::new(format!(
            "Device {} found, but it is of type {}, expected {}.",
            name, record.kind, kind
        ))),
        None => Err(CheckFailure::new(format!(
            "Device {} of type {} not found in the network.",
            name, kind
        ))),
    }
}

fn cable_connection(topology: &Topology, source: &str, destination: &str) -> Result<(), CheckFailure> {
    let a = topology
        .device_by_name(source)
        .ok_or_else(|| CheckFailure::new(format!("Source device '{}' not found in the network.", source)))?;
    let b = topology
        .device_by_name(destination)
        .ok_or_else(|| CheckFailure::new(format!("Destination device '{}' not found in the network.", destination)))?;

    if a.is_connected_to(&b.mac_address()) {
        Ok(())
    } else {
        Err(CheckFailure::new(format!(
            "Device {} is not connected to {}.",
            source, destination
        )))
    }
}

fn ping(topology: &Topology, source: &str, destination: Ipv4Addr) -> Result<(), CheckFailure> {
    if topology.device_by_name(source).is_none() {
        return Err(CheckFailure::new(format!(
            "Source device '{}' not found in the network.",
            source
        )));
    }
    match topology.ping(source, destination) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CheckFailure::new(format!(
            "Ping from {} to {} failed.",
            source, destination
        ))),
        Err(err) => Err(CheckFailure::new(err.to_string())),
    }
}

/// Run every check, including the ones after a failure.
pub fn evaluate_all(checks: &[Check], topology: &Topology) -> Vec<CheckOutcome> {
    checks
        .iter()
        .map(|check| {
            let result = check.evaluate(topology);
            debug!("{:?}: {:?}", check, result);
            CheckOutcome {
                check: check.clone(),
                passed: result.is_ok(),
                message: result.err().map(|failure| failure.message),
            }
        })
        .collect()
}
