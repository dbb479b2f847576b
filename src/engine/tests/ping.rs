use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use wirecraft_engine::routing::parse_cidr;
use wirecraft_engine::{
    send_arp_request, send_ping, ArpCapability, Capability, EthernetCapability, IcmpCapability, Ipv4Capability,
    Layer2Switching, MacAddress, NetworkDevice, RoutingCapability,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn host(id: u32, ip: Ipv4Addr) -> Arc<NetworkDevice> {
    let routing = RoutingCapability::new();
    routing.add_route(parse_cidr("192.168.0.0/24").unwrap(), None, 0);

    let mut device = NetworkDevice::host(MacAddress::from_device_id(id));
    device
        .add_capabilities([
            Capability::from(EthernetCapability::new()),
            Capability::from(routing),
            Capability::from(ArpCapability::new()),
            Capability::from(Ipv4Capability::new(ip)),
            Capability::from(IcmpCapability::new()),
        ])
        .unwrap();
    Arc::new(device)
}

fn switch(id: u32) -> Arc<NetworkDevice> {
    let mut device = NetworkDevice::switch(MacAddress::from_device_id(id));
    device.add_capability(Layer2Switching::new()).unwrap();
    Arc::new(device)
}

fn arp(device: &NetworkDevice) -> &ArpCapability {
    device.capability::<ArpCapability>().unwrap()
}

fn mac_table(device: &NetworkDevice) -> &Layer2Switching {
    device.capability::<Layer2Switching>().unwrap()
}

const IP_A: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 2);
const IP_B: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 3);
const IP_ABSENT: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 4);

#[test]
fn test_direct_ping() {
    init();
    let a = host(1, IP_A);
    let b = host(2, IP_B);

    assert_eq!(send_ping(&a, IP_B), Ok(false));
    assert!(arp(&a).is_empty());

    a.add_connection(0, &b, 0);
    assert_eq!(send_ping(&a, IP_B), Ok(true));
    assert_eq!(arp(&a).lookup(IP_B), Some(b.mac_address()));
    assert_eq!(arp(&b).lookup(IP_A), Some(a.mac_address()));

    assert_eq!(send_ping(&b, IP_A), Ok(true));
    assert_eq!(send_ping(&a, IP_ABSENT), Ok(false));
}

#[test]
fn test_switched_ping() {
    init();
    let a = host(1, IP_A);
    let b = host(2, IP_B);
    let sw1 = switch(10);
    let sw2 = switch(11);

    a.add_connection(0, &sw1, 0);
    sw1.add_connection(1, &sw2, 0);
    sw2.add_connection(1, &b, 0);

    assert_eq!(send_ping(&a, IP_B), Ok(true));
    assert_eq!(mac_table(&sw1).port_for(&a.mac_address()), Some(0));
    assert_eq!(mac_table(&sw1).port_for(&b.mac_address()), Some(1));
    assert_eq!(mac_table(&sw2).port_for(&a.mac_address()), Some(0));
    assert_eq!(mac_table(&sw2).port_for(&b.mac_address()), Some(1));

    assert_eq!(send_ping(&b, IP_A), Ok(true));
    assert_eq!(send_ping(&a, IP_ABSENT), Ok(false));
}

#[test]
fn test_flood_skips_ingress_and_finds_the_right_host() {
    init();
    let a = host(1, IP_A);
    let b = host(2, IP_B);
    let c = host(3, Ipv4Addr::new(192, 168, 0, 5));
    let sw = switch(10);

    a.add_connection(0, &sw, 0);
    c.add_connection(0, &sw, 1);
    b.add_connection(0, &sw, 2);

    assert_eq!(send_arp_request(&a, IP_B), Ok(Some(b.mac_address())));
    // `c` saw the broadcast but was not asked.
    assert_eq!(arp(&c).lookup(IP_A), Some(a.mac_address()));
    assert_eq!(mac_table(&sw).port_for(&b.mac_address()), Some(2));
    assert_eq!(send_ping(&a, IP_B), Ok(true));
}

#[test]
fn test_switch_loop_terminates() {
    init();
    let a = host(1, IP_A);
    let sw1 = switch(10);
    let sw2 = switch(11);
    let sw3 = switch(12);

    a.add_connection(0, &sw1, 0);
    sw1.add_connection(1, &sw2, 0);
    sw2.add_connection(1, &sw3, 0);
    sw3.add_connection(1, &sw1, 2);

    assert_eq!(send_ping(&a, IP_ABSENT), Ok(false));
    assert_eq!(send_arp_request(&a, IP_ABSENT), Ok(None));
}

#[test]
fn test_arp_learns_from_request_and_reply() {
    init();
    let a = host(1, IP_A);
    let b = host(2, IP_B);
    a.add_connection(0, &b, 0);

    assert_eq!(send_arp_request(&a, IP_B), Ok(Some(b.mac_address())));
    // The request taught `b` about `a`, the reply taught `a` about `b`.
    assert_eq!(arp(&b).entries(), [(IP_A, a.mac_address())]);
    assert_eq!(arp(&a).entries(), [(IP_B, b.mac_address())]);
}

#[test]
fn test_unplugged_cable_breaks_ping() {
    init();
    let a = host(1, IP_A);
    let b = host(2, IP_B);
    a.add_connection(0, &b, 0);
    assert_eq!(send_ping(&a, IP_B), Ok(true));

    assert!(b.remove_connection(0).is_some());
    // The ARP entry survives, the frame has nowhere to go.
    assert_eq!(arp(&a).lookup(IP_B), Some(b.mac_address()));
    assert_eq!(send_ping(&a, IP_B), Ok(false));
}

fn switch_mesh(size: u32) -> Vec<Arc<NetworkDevice>> {
    let switches: Vec<_> = (0..size).map(|i| switch(100 + i)).collect();
    for (i, a) in switches.iter().enumerate() {
        for (j, b) in switches.iter().enumerate().skip(i + 1) {
            // Port `k` of every switch leads to switch `k`; port `i` of switch `i` stays free.
            a.add_connection(j as u16, b, i as u16);
        }
    }
    switches
}

#[test]
fn test_full_mesh_flood_terminates() {
    init();
    for size in [5, 6, 8] {
        let a = host(1, IP_A);
        let b = host(2, IP_B);
        let mesh = switch_mesh(size);
        a.add_connection(0, &mesh[0], 0);
        b.add_connection(0, &mesh[size as usize - 1], size as u16 - 1);

        let started = Instant::now();
        assert_eq!(send_ping(&a, IP_ABSENT), Ok(false));
        assert_eq!(send_ping(&a, IP_B), Ok(true));
        assert!(started.elapsed() < Duration::from_secs(5), "mesh of {} took {:?}", size, started.elapsed());
    }
}

#[test]
fn test_long_switch_chain() {
    init();
    let a = host(1, IP_A);
    let b = host(2, IP_B);
    let chain: Vec<_> = (0..16).map(|i| switch(100 + i)).collect();

    a.add_connection(0, &chain[0], 0);
    for pair in chain.windows(2) {
        pair[0].add_connection(1, &pair[1], 0);
    }
    chain[15].add_connection(1, &b, 0);

    assert_eq!(a.reachable_count(), 18);
    assert_eq!(send_ping(&a, IP_B), Ok(true));
    assert_eq!(send_ping(&b, IP_A), Ok(true));
    assert_eq!(mac_table(&chain[7]).port_for(&b.mac_address()), Some(1));
}

#[test]
fn test_ping_through_gateway() {
    init();
    let gateway_ip = Ipv4Addr::new(192, 168, 0, 1);
    let a = host(1, IP_A);
    a.capability::<RoutingCapability>()
        .unwrap()
        .add_route(parse_cidr("0.0.0.0/0").unwrap(), Some(gateway_ip), 0);
    let gateway = host(2, gateway_ip);
    let sw = switch(10);
    a.add_connection(0, &sw, 0);
    gateway.add_connection(0, &sw, 1);

    assert_eq!(send_ping(&a, Ipv4Addr::new(10, 0, 0, 5)), Ok(true));
    assert_eq!(arp(&a).entries(), [(gateway_ip, gateway.mac_address())]);

    assert!(gateway.remove_connection(0).is_some());
    assert_eq!(send_ping(&a, Ipv4Addr::new(10, 0, 0, 5)), Ok(false));
}
