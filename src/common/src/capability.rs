use bitflags::bitflags;
use core::fmt;

/// The closed set of protocol capabilities a device can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CapabilityKind {
    /// Accepts Ethernet frames addressed to the device and demuxes them.
    Ethernet,
    /// Learning Layer-2 switch.
    Switching,
    /// ARP responder and cache.
    Arp,
    /// IPv4 host handling.
    Ipv4,
    /// ICMP echo.
    Icmp,
    /// Static routing table for outgoing traffic.
    Routing,
}

impl CapabilityKind {
    /// Every kind, in declaration order.
    pub const ALL: [CapabilityKind; 6] = [
        CapabilityKind::Ethernet,
        CapabilityKind::Switching,
        CapabilityKind::Arp,
        CapabilityKind::Ipv4,
        CapabilityKind::Icmp,
        CapabilityKind::Routing,
    ];

    /// The single-bit set matching this kind.
    pub const fn flag(self) -> CapabilitySet {
        match self {
            CapabilityKind::Ethernet => CapabilitySet::ETHERNET,
            CapabilityKind::Switching => CapabilitySet::SWITCHING,
            CapabilityKind::Arp => CapabilitySet::ARP,
            CapabilityKind::Ipv4 => CapabilitySet::IPV4,
            CapabilityKind::Icmp => CapabilitySet::ICMP,
            CapabilityKind::Routing => CapabilitySet::ROUTING,
        }
    }

    /// Short lowercase name used in logs and error messages.
    pub const fn name(self) -> &'static str {
        match self {
            CapabilityKind::Ethernet => "ethernet",
            CapabilityKind::Switching => "switching",
            CapabilityKind::Arp => "arp",
            CapabilityKind::Ipv4 => "ipv4",
            CapabilityKind::Icmp => "icmp",
            CapabilityKind::Routing => "routing",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of capability kinds, used to express requirements and report
    /// what a device is missing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CapabilitySet: u8 {
        const ETHERNET  = 1 << 0;
        const SWITCHING = 1 << 1;
        const ARP       = 1 << 2;
        const IPV4      = 1 << 3;
        const ICMP      = 1 << 4;
        const ROUTING   = 1 << 5;
    }
}

impl CapabilitySet {
    /// Capabilities a device needs to originate traffic.
    pub const SENDER: CapabilitySet = CapabilitySet::ROUTING
        .union(CapabilitySet::ARP)
        .union(CapabilitySet::IPV4);

    /// Iterate the kinds contained in this set.
    pub fn kinds(self) -> impl Iterator<Item = CapabilityKind> {
        CapabilityKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(kind.flag()))
    }
}

impl From<CapabilityKind> for CapabilitySet {
    fn from(kind: CapabilityKind) -> Self {
        kind.flag()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, kind) in self.kinds().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", kind)?;
        }
        Ok(())
    }
}

/// What a simulated node is, as persisted by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceKind {
    /// An end host (persisted as `"pc"`).
    #[cfg_attr(feature = "serde", serde(rename = "pc"))]
    Host,
    /// A Layer-2 switch (persisted as `"switch"`).
    #[cfg_attr(feature = "serde", serde(rename = "switch"))]
    Switch,
}

impl DeviceKind {
    /// The persisted name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            DeviceKind::Host => "pc",
            DeviceKind::Switch => "switch",
        }
    }

    /// Whether a capability of the given kind may be bound to this device.
    ///
    /// Only switches can switch; every other capability fits any device.
    pub const fn supports(self, capability: CapabilityKind) -> bool {
        match capability {
            CapabilityKind::Switching => matches!(self, DeviceKind::Switch),
            _ => true,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_set() {
        let present = CapabilitySet::ROUTING | CapabilitySet::ICMP;
        let missing = CapabilitySet::SENDER.difference(present);
        assert_eq!(missing, CapabilitySet::ARP | CapabilitySet::IPV4);
        assert_eq!(missing.to_string(), "arp, ipv4");
        assert_eq!(CapabilitySet::empty().to_string(), "none");
    }

    #[test]
    fn test_switching_only_on_switches() {
        assert!(!DeviceKind::Host.supports(CapabilityKind::Switching));
        assert!(DeviceKind::Switch.supports(CapabilityKind::Switching));
        for kind in CapabilityKind::ALL {
            assert!(DeviceKind::Switch.supports(kind));
        }
    }
}
