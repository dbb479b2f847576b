//! Types shared across the Wirecraft simulation crates.

pub mod capability;
pub mod error;

pub use capability::{CapabilityKind, CapabilitySet, DeviceKind};
pub use error::{SimError, TopologyError};
