//! Simulated network node.
//!
//! Frames are not sent through cables. A device looks up the neighbor
//! attached to a port and calls its [`NetworkDevice::handle_request`]
//! directly; the reply travels back as the return value.

use core::borrow::Borrow;
use core::cell::RefCell;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::sync::{Arc, Weak};

use log::{debug, trace, warn};
use spin::Mutex;
use wirecraft_common::{CapabilityKind, CapabilitySet, DeviceKind, SimError};

use crate::addressing::MacAddress;
use crate::bimap::BidirectionalMap;
use crate::capability::{Capability, CapabilityVariant, Ipv4Capability};
use crate::osi::{EthernetFrame, Message, MessageKind};
use crate::routing::PortNumber;

/// Ceiling on nested [`NetworkDevice::handle_request`] calls, whatever the
/// size of the network.
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// State of the frame exchange started by the outermost
/// [`NetworkDevice::handle_request`] on this thread.
///
/// Nothing decrements a TTL on the way, so on a cyclic topology this is what
/// stops a flood: a device drops a frame it already handled in the same
/// traversal, and nesting never goes deeper than the number of devices
/// reachable from where the traversal started.
struct Traversal {
    depth: usize,
    limit: usize,
    seen: HashSet<(MacAddress, EthernetFrame)>,
}

thread_local! {
    static TRAVERSAL: RefCell<Option<Traversal>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HopRefused {
    AlreadySeen,
    TooDeep(usize),
}

/// One hop on the current call stack. Released on drop; the last one
/// released ends the traversal.
struct HopGuard;

impl HopGuard {
    fn enter(device: &NetworkDevice, frame: &EthernetFrame) -> Result<HopGuard, HopRefused> {
        let active = TRAVERSAL.with(|slot| slot.borrow().is_some());
        let limit = if active {
            0
        } else {
            device.reachable_count().min(MAX_TRAVERSAL_DEPTH)
        };

        TRAVERSAL.with(|slot| {
            let mut slot = slot.borrow_mut();
            let traversal = slot.get_or_insert_with(|| Traversal {
                depth: 0,
                limit,
                seen: HashSet::new(),
            });

            let refused = if traversal.depth >= traversal.limit {
                Some(HopRefused::TooDeep(traversal.limit))
            } else if !traversal.seen.insert((device.mac_address, frame.clone())) {
                Some(HopRefused::AlreadySeen)
            } else {
                None
            };

            let Some(reason) = refused else {
                traversal.depth += 1;
                return Ok(HopGuard);
            };
            let idle = traversal.depth == 0;
            if idle {
                *slot = None;
            }
            Err(reason)
        })
    }
}

impl Drop for HopGuard {
    fn drop(&mut self) {
        TRAVERSAL.with(|slot| {
            let mut slot = slot.borrow_mut();
            let finished = match slot.as_mut() {
                Some(traversal) => {
                    traversal.depth = traversal.depth.saturating_sub(1);
                    traversal.depth == 0
                }
                None => false,
            };
            if finished {
                *slot = None;
            }
        });
    }
}

/// A neighbor as seen from one device: its identity plus a non-owning
/// handle. Equality and hashing go by MAC address only.
#[derive(Clone)]
pub struct Peer {
    mac_address: MacAddress,
    device: Weak<NetworkDevice>,
}

impl Peer {
    fn new(device: &Arc<NetworkDevice>) -> Self {
        Self {
            mac_address: device.mac_address,
            device: Arc::downgrade(device),
        }
    }

    pub fn mac_address(&self) -> MacAddress {
        self.mac_address
    }

    /// The neighbor, if it is still alive.
    pub fn upgrade(&self) -> Option<Arc<NetworkDevice>> {
        self.device.upgrade()
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.mac_address == other.mac_address
    }
}

impl Eq for Peer {}

impl Hash for Peer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mac_address.hash(state);
    }
}

impl Borrow<MacAddress> for Peer {
    fn borrow(&self) -> &MacAddress {
        &self.mac_address
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peer({})", self.mac_address)
    }
}

/// A simulated node: an identity, a port table and a set of capabilities.
///
/// Capabilities are attached while the device is still exclusively owned;
/// once wrapped in an [`Arc`] it can be cabled to other devices.
pub struct NetworkDevice {
    mac_address: MacAddress,
    kind: DeviceKind,
    connected_devices: Mutex<BidirectionalMap<Peer, PortNumber>>,
    data_handlers: BTreeMap<MessageKind, CapabilityKind>,
    capabilities: BTreeMap<CapabilityKind, Capability>,
}

impl NetworkDevice {
    /// Create a device with no capabilities and no connections.
    pub fn new(mac_address: MacAddress, kind: DeviceKind) -> Self {
        Self {
            mac_address,
            kind,
            connected_devices: Mutex::new(BidirectionalMap::new()),
            data_handlers: BTreeMap::new(),
            capabilities: BTreeMap::new(),
        }
    }

    pub fn host(mac_address: MacAddress) -> Self {
        Self::new(mac_address, DeviceKind::Host)
    }

    pub fn switch(mac_address: MacAddress) -> Self {
        Self::new(mac_address, DeviceKind::Switch)
    }

    pub fn mac_address(&self) -> MacAddress {
        self.mac_address
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Bind a capability to this device.
    ///
    /// Rejected without touching the registry when the device kind cannot
    /// carry it. A capability of a kind already present replaces it.
    pub fn add_capability(&mut self, capability: impl Into<Capability>) -> Result<(), SimError> {
        let capability = capability.into();
        self.check_compatible(&capability)?;
        self.bind(capability);
        Ok(())
    }

    /// Bind several capabilities at once. Either all of them are bound or,
    /// if one is incompatible, none is.
    pub fn add_capabilities<I>(&mut self, capabilities: I) -> Result<(), SimError>
    where
        I: IntoIterator<Item = Capability>,
    {
        let capabilities: Vec<Capability> = capabilities.into_iter().collect();
        for capability in &capabilities {
            self.check_compatible(capability)?;
        }
        for capability in capabilities {
            self.bind(capability);
        }
        Ok(())
    }

    fn check_compatible(&self, capability: &Capability) -> Result<(), SimError> {
        if self.kind.supports(capability.kind()) {
            Ok(())
        } else {
            Err(SimError::IncompatibleCapability {
                capability: capability.kind(),
                device: self.kind,
            })
        }
    }

    fn bind(&mut self, capability: Capability) {
        let kind = capability.kind();
        if let Some(message_kind) = capability.handles() {
            if let Some(previous) = self.data_handlers.insert(message_kind, kind) {
                if previous != kind {
                    warn!("{}: {} now handled by {} instead of {}", self, message_kind, kind, previous);
                }
            }
        }
        self.capabilities.insert(kind, capability);
    }

    /// Typed access to a bound capability.
    pub fn capability<C: CapabilityVariant>(&self) -> Option<&C> {
        self.capabilities.get(&C::KIND).and_then(C::from_capability)
    }

    pub fn has_capability(&self, kind: CapabilityKind) -> bool {
        self.capabilities.contains_key(&kind)
    }

    /// Kinds of every bound capability.
    pub fn capability_set(&self) -> CapabilitySet {
        self.capabilities
            .keys()
            .fold(CapabilitySet::empty(), |set, kind| set | kind.flag())
    }

    /// The capability receiving messages of `kind`, if any.
    pub fn handler_for(&self, kind: MessageKind) -> Option<&Capability> {
        let capability = self.data_handlers.get(&kind)?;
        self.capabilities.get(capability)
    }

    /// The configured IPv4 address, when the device has an IPv4 capability.
    pub fn ip_address(&self) -> Option<Ipv4Addr> {
        self.capability::<Ipv4Capability>().map(Ipv4Capability::ip_address)
    }

    /// Cable `port` of this device to `peer_port` of `peer`, on both ends.
    pub fn add_connection(self: &Arc<Self>, port: PortNumber, peer: &Arc<NetworkDevice>, peer_port: PortNumber) {
        debug!("{}: connecting port {} to {} port {}", self, port, peer, peer_port);
        self.connected_devices.lock().set(Peer::new(peer), port);
        peer.connected_devices.lock().set(Peer::new(self), peer_port);
    }

    /// Unplug whatever is on `port`, on both ends.
    pub fn remove_connection(&self, port: PortNumber) -> Option<Arc<NetworkDevice>> {
        let peer = self.connected_devices.lock().remove_by_value(&port)?;
        let device = peer.upgrade()?;
        device.connected_devices.lock().remove(&self.mac_address);
        debug!("{}: disconnected port {} from {}", self, port, device);
        Some(device)
    }

    /// The local port `device` is attached to.
    pub fn port_of(&self, device: &NetworkDevice) -> Option<PortNumber> {
        self.connected_devices.lock().get(&device.mac_address).copied()
    }

    pub fn is_connected_to(&self, mac_address: &MacAddress) -> bool {
        self.connected_devices.lock().contains_key(mac_address)
    }

    /// The live neighbor attached to `port`.
    pub fn neighbor_on(&self, port: PortNumber) -> Option<Arc<NetworkDevice>> {
        self.connected_devices
            .lock()
            .get_by_value(&port)
            .and_then(Peer::upgrade)
    }

    /// Live neighbors in ascending port order.
    pub fn neighbors(&self) -> Vec<(PortNumber, Arc<NetworkDevice>)> {
        let mut neighbors: Vec<(PortNumber, Arc<NetworkDevice>)> = self
            .connected_devices
            .lock()
            .iter()
            .filter_map(|(peer, port)| peer.upgrade().map(|device| (*port, device)))
            .collect();
        neighbors.sort_by_key(|(port, _)| *port);
        neighbors
    }

    /// Number of live devices connected to this one, directly or not,
    /// itself included.
    pub fn reachable_count(&self) -> usize {
        let mut visited: HashSet<MacAddress> = HashSet::from([self.mac_address]);
        let mut queue: VecDeque<Arc<NetworkDevice>> =
            self.neighbors().into_iter().map(|(_, device)| device).collect();
        while let Some(device) = queue.pop_front() {
            if visited.insert(device.mac_address) {
                queue.extend(device.neighbors().into_iter().map(|(_, next)| next));
            }
        }
        visited.len()
    }

    /// Receive `frame` from the directly connected `source`.
    ///
    /// This is the entry point of every hop. Unhandled frames are dropped,
    /// and so are frames this device already handled earlier in the same
    /// traversal or that arrive deeper than the network is large.
    pub fn handle_request(&self, source: &NetworkDevice, frame: EthernetFrame) -> Option<EthernetFrame> {
        let _hop = match HopGuard::enter(self, &frame) {
            Ok(hop) => hop,
            Err(HopRefused::AlreadySeen) => {
                trace!("{}: already handled this frame from {}, dropping", self, frame.source_mac);
                return None;
            }
            Err(HopRefused::TooDeep(limit)) => {
                warn!(
                    "{}: dropping frame from {}, traversal depth {} reached",
                    self, source.mac_address, limit
                );
                return None;
            }
        };
        trace!("{}: handling request from {}", self, source);

        match self.dispatch(source, Message::Ethernet(frame))? {
            Message::Ethernet(reply) => Some(reply),
            other => {
                warn!("{}: Ethernet handler answered with {}", self, other.kind());
                None
            }
        }
    }

    /// Hand `message` to the capability registered for its kind.
    pub fn dispatch(&self, source: &NetworkDevice, message: Message) -> Option<Message> {
        let kind = message.kind();
        let Some(capability) = self.handler_for(kind) else {
            debug!("{}: no handler found for {}", self, kind);
            return None;
        };
        capability.handle(self, source, message)
    }
}

impl PartialEq for NetworkDevice {
    /// Two devices with the same MAC address should never coexist.
    fn eq(&self, other: &Self) -> bool {
        self.mac_address == other.mac_address
    }
}

impl Eq for NetworkDevice {}

impl Hash for NetworkDevice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mac_address.hash(state);
    }
}

impl fmt::Display for NetworkDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.mac_address)?;
        if let Some(ip) = self.ip_address() {
            write!(f, " ~ {}", ip)?;
        }
        Ok(())
    }
}

impl fmt::Debug for NetworkDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkDevice")
            .field("mac_address", &self.mac_address)
            .field("kind", &self.kind)
            .field("capabilities", &self.capability_set())
            .finish()
    }
}
