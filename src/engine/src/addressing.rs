//! Link-layer addressing.
//!
//! IPv4 addresses and networks are not redefined here: the engine uses
//! [`std::net::Ipv4Addr`] and [`smoltcp::wire::Ipv4Cidr`] as they are.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smoltcp::wire::EthernetAddress;

/// A 48-bit MAC address, rendered as lowercase colon-hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Build an address from its six octets.
    pub const fn new(octets: [u8; 6]) -> Self {
        MacAddress(octets)
    }

    /// The all-ones broadcast address `ff:ff:ff:ff:ff:ff`.
    pub const fn broadcast() -> Self {
        MacAddress(EthernetAddress::BROADCAST.0)
    }

    /// Whether this is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        EthernetAddress(self.0).is_broadcast()
    }

    /// The raw octets.
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Derive a stable address from a persisted device id.
    ///
    /// The first octet marks the address as locally administered unicast,
    /// the second is a fixed mix of the id and the last four carry the id
    /// itself, so distinct ids never share an address and
    /// [`MacAddress::device_id`] can recover it.
    pub fn from_device_id(id: u32) -> Self {
        let mixed = splitmix64(u64::from(id)).to_be_bytes();
        let id = id.to_be_bytes();
        MacAddress([0x02, mixed[0], id[0], id[1], id[2], id[3]])
    }

    /// The device id encoded in the last four octets.
    pub fn device_id(&self) -> u32 {
        u32::from_be_bytes([self.0[2], self.0[3], self.0[4], self.0[5]])
    }
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

impl From<EthernetAddress> for MacAddress {
    fn from(addr: EthernetAddress) -> Self {
        MacAddress(addr.0)
    }
}

impl From<MacAddress> for EthernetAddress {
    fn from(addr: MacAddress) -> Self {
        EthernetAddress(addr.0)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Error returned when a string is not a MAC address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacParseError(String);

impl fmt::Display for MacParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid MAC address {:?}", self.0)
    }
}

impl std::error::Error for MacParseError {}

impl FromStr for MacAddress {
    type Err = MacParseError;

    /// Accepts six hex octets separated by `:` or `-`, in either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<EthernetAddress>()
            .map(MacAddress::from)
            .map_err(|()| MacParseError(s.to_string()))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast() {
        assert!(MacAddress::broadcast().is_broadcast());
        assert_eq!(MacAddress::broadcast().to_string(), "ff:ff:ff:ff:ff:ff");

        let mac: MacAddress = "AA:AA:AA:AA:AA:AA".parse().unwrap();
        assert!(!mac.is_broadcast());
        assert!(!MacAddress::new([0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]).is_broadcast());
    }

    #[test]
    fn test_parse_and_display() {
        let mac: MacAddress = "11-11-EE-ff-00-11".parse().unwrap();
        assert_eq!(mac.to_string(), "11:11:ee:ff:00:11");
        assert_eq!(mac, "11:11:ee:ff:00:11".parse().unwrap());

        assert!("11:11:ee:ff:00".parse::<MacAddress>().is_err());
        assert!("11:11:ee:ff:00:11:22".parse::<MacAddress>().is_err());
        assert!("11:11-ee:ff:00:11".parse::<MacAddress>().is_err());
        assert!("11:11:ee:ff:00:111".parse::<MacAddress>().is_err());
        assert!("zz:11:ee:ff:00:11".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_device_id_round_trip() {
        for id in [0u32, 1, 42, 7_983_034, 0x00ff_ffff, 0x0100_0001, u32::MAX] {
            let mac = MacAddress::from_device_id(id);
            assert_eq!(mac.device_id(), id);
            assert_eq!(mac.octets()[0], 0x02);
            assert!(!mac.is_broadcast());
            assert_eq!(mac, MacAddress::from_device_id(id));
        }
        assert!(MacAddress::from_device_id(7_983_034)
            .to_string()
            .ends_with("79:cf:ba"));
        assert_ne!(MacAddress::from_device_id(1), MacAddress::from_device_id(2));
        // Ids sharing their low 24 bits still get distinct addresses.
        assert_ne!(MacAddress::from_device_id(1), MacAddress::from_device_id(0x0100_0001));
        assert_ne!(MacAddress::from_device_id(5), MacAddress::from_device_id(0xff00_0005));
    }

    #[test]
    fn test_serde_as_string() {
        let mac = MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"aa:bb:cc:dd:ee:ff\"");
        let back: MacAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }
}
