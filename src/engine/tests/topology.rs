use std::net::Ipv4Addr;

use wirecraft_engine::{evaluate_all, Check, DeviceKind, SimulationConfig, Topology, TopologyError};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const LEVEL: &str = r#"{
    "devices": [
        {"id": 1, "name": "pc1", "type": "pc", "x": 100, "y": 80, "ip": "192.168.0.2"},
        {"id": 2, "name": "pc2", "type": "pc", "x": 300, "y": 80, "ip": "192.168.0.3"},
        {"id": 3, "name": "sw", "type": "switch", "x": 200, "y": 200},
        {"id": 4, "name": "pc3", "type": "pc", "x": 400, "y": 300, "ip": "192.168.0.4"}
    ],
    "cables": [
        {"device_id_1": 1, "port_1": 0, "device_id_2": 3, "port_2": 0},
        {"device_id_1": 3, "port_1": 1, "device_id_2": 2, "port_2": 0}
    ]
}"#;

fn level() -> Topology {
    Topology::from_json(LEVEL, &SimulationConfig::default()).unwrap()
}

#[test]
fn test_ping_through_built_topology() {
    init();
    let topology = level();
    assert_eq!(topology.len(), 4);
    assert_eq!(topology.id_of("sw"), Some(3));

    assert_eq!(topology.ping("pc1", Ipv4Addr::new(192, 168, 0, 3)), Ok(true));
    assert_eq!(topology.ping("pc2", Ipv4Addr::new(192, 168, 0, 2)), Ok(true));
    assert_eq!(topology.ping("pc1", Ipv4Addr::new(192, 168, 0, 4)), Ok(false));
    assert_eq!(topology.ping("nobody", Ipv4Addr::new(192, 168, 0, 2)), Ok(false));
}

#[test]
fn test_unknown_cable_endpoint() {
    init();
    let json = r#"{
        "devices": [{"id": 1, "name": "pc1", "type": "pc", "x": 0, "y": 0, "ip": "192.168.0.2"}],
        "cables": [{"device_id_1": 1, "port_1": 0, "device_id_2": 7, "port_2": 0}]
    }"#;
    assert_eq!(
        Topology::from_json(json, &SimulationConfig::default()).unwrap_err(),
        TopologyError::UnknownDevice(7)
    );
}

#[test]
fn test_check_messages() {
    init();
    let topology = level();
    let ip = |last| Ipv4Addr::new(192, 168, 0, last);

    let checks = [
        Check::DevicePresence {
            name: "sw".to_string(),
            kind: DeviceKind::Switch,
        },
        Check::DevicePresence {
            name: "pc1".to_string(),
            kind: DeviceKind::Switch,
        },
        Check::DevicePresence {
            name: "router".to_string(),
            kind: DeviceKind::Switch,
        },
        Check::CableConnection {
            source: "pc1".to_string(),
            destination: "sw".to_string(),
        },
        Check::CableConnection {
            source: "ghost".to_string(),
            destination: "sw".to_string(),
        },
        Check::CableConnection {
            source: "pc1".to_string(),
            destination: "ghost".to_string(),
        },
        Check::CableConnection {
            source: "pc1".to_string(),
            destination: "pc2".to_string(),
        },
        Check::Ping {
            source: "pc1".to_string(),
            destination: ip(3),
        },
        Check::Ping {
            source: "ghost".to_string(),
            destination: ip(3),
        },
        Check::Ping {
            source: "pc3".to_string(),
            destination: ip(2),
        },
    ];

    let messages: Vec<Option<String>> = evaluate_all(&checks, &topology)
        .into_iter()
        .map(|outcome| {
            assert_eq!(outcome.passed, outcome.message.is_none());
            outcome.message
        })
        .collect();

    assert_eq!(
        messages,
        [
            None,
            Some("Device pc1 found, but it is of type pc, expected switch.".to_string()),
            Some("Device router of type switch not found in the network.".to_string()),
            None,
            Some("Source device 'ghost' not found in the network.".to_string()),
            Some("Destination device 'ghost' not found in the network.".to_string()),
            Some("Device pc1 is not connected to pc2.".to_string()),
            None,
            Some("Source device 'ghost' not found in the network.".to_string()),
            Some("Ping from pc3 to 192.168.0.2 failed.".to_string()),
        ]
    );
}

#[test]
fn test_misconfigured_ping_is_reported_as_failure() {
    init();
    let json = r#"{
        "devices": [{"id": 1, "name": "pc1", "type": "pc", "x": 0, "y": 0}],
        "cables": []
    }"#;
    let topology = Topology::from_json(json, &SimulationConfig::default()).unwrap();
    let check = Check::Ping {
        source: "pc1".to_string(),
        destination: Ipv4Addr::new(192, 168, 0, 2),
    };
    let failure = check.evaluate(&topology).unwrap_err();
    assert_eq!(failure.message, "missing required capabilities: ipv4");
}
