//! Simulation configuration.

use serde::{Deserialize, Serialize};
use smoltcp::wire::Ipv4Cidr;
use std::net::Ipv4Addr;

use crate::requests::DEFAULT_TTL;
use crate::routing::PortNumber;

/// Settings applied to every host built from persisted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Network of the route every host starts with.
    #[serde(with = "cidr_string")]
    pub default_network: Ipv4Cidr,
    /// Interface of that route.
    pub default_interface: PortNumber,
    /// TTL of pings started from a topology.
    pub initial_ttl: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            default_network: Ipv4Cidr::new(Ipv4Addr::new(192, 168, 0, 0), 24),
            default_interface: 0,
            initial_ttl: DEFAULT_TTL,
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON object. Missing fields take their default.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

mod cidr_string {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use smoltcp::wire::Ipv4Cidr;

    use crate::routing::parse_cidr;

    pub fn serialize<S: Serializer>(cidr: &Ipv4Cidr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(cidr)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Ipv4Cidr, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_cidr(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.default_network.to_string(), "192.168.0.0/24");
        assert_eq!(config.default_interface, 0);
        assert_eq!(config.initial_ttl, 64);
        assert_eq!(SimulationConfig::from_json("{}").unwrap(), config);
    }

    #[test]
    fn test_from_json() {
        let config = SimulationConfig::from_json(r#"{"default_network": "10.1.0.0/16", "initial_ttl": 8}"#).unwrap();
        assert_eq!(config.default_network.prefix_len(), 16);
        assert_eq!(config.default_interface, 0);
        assert_eq!(config.initial_ttl, 8);

        assert!(SimulationConfig::from_json(r#"{"default_network": "10.1.0.0/40"}"#).is_err());
    }
}
