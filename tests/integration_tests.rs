//! Integration tests for pfrule
//!
//! These tests go from on-disk documents (rule sets, protocol databases,
//! configuration) to rendered configuration text through the public API.

#![allow(clippy::uninlined_format_args)]

use pfrule::config::{self, AppConfig};
use pfrule::core::address::{Address, AddressMatch};
use pfrule::core::firewall::{Action, Direction, Rule, RuleSet};
use pfrule::core::flags::{FlagSet, TcpFlags};
use pfrule::core::port::{PortMatch, PortOp};
use pfrule::{Error, Protocol, ProtocolTable};
use std::path::PathBuf;

const PROTOCOLS: &str = "\
# protocols(5)
ip      0   IP          # internet protocol, pseudo protocol number
icmp    1   ICMP        # internet control message protocol
tcp     6   TCP         # transmission control protocol
udp     17  UDP         # user datagram protocol
gre     47  GRE         # Generic Routing Encapsulation
esp     50  IPSEC-ESP   # Encap Security Payload
this line is not a record
carp    112 CARP        # Common Address Redundancy Protocol
";

/// Writes `contents` into a fresh temporary directory
fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn test_ruleset_document_renders() {
    let (_dir, path) = write_temp(
        "rules.json",
        r#"{ "rules": [
            {
                "action": "drop", "return": true, "direction": "in", "quick": true,
                "log": true, "log_all": true, "log_interface": 3
            },
            {
                "protocol": 6,
                "destination": { "port": { "op": "eq", "low": 22 } },
                "state": "keep",
                "flags": { "set": "SYN", "out_of": "SYN | ACK" }
            },
            {
                "direction": "out", "address_family": "inet", "protocol": 17,
                "source": { "negate": true, "address": { "network": "10.0.0.0/8" } },
                "destination": { "address": { "table": "dns" }, "port": { "op": "range_inclusive", "low": 1024, "high": 65535 } }
            }
        ] }"#,
    );

    let ruleset = RuleSet::load(&path).unwrap();
    let text = ruleset.to_pf_conf(&ProtocolTable::new()).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines,
        vec![
            "block return in log (all, to pflog3) quick from any to any",
            "pass proto tcp from any to any port 22 keep state",
            "pass out inet proto udp from ! 10.0.0.0/8 to <dns> port 1024:65535",
        ]
    );
    assert!(!text.ends_with('\n'));
}

#[test]
fn test_protocol_file_enriches_rendering() {
    let (_dir, path) = write_temp("protocols", PROTOCOLS);
    let table = ProtocolTable::system(&path);

    assert_eq!(table.lookup(Protocol::ANY), "any");
    assert_eq!(table.lookup(Protocol(112)), "carp");

    let mut rule = Rule::new();
    rule.set_direction(Direction::In);
    rule.set_protocol(Protocol(47));
    assert_eq!(
        rule.to_pf_conf(&table).unwrap(),
        "pass in proto gre from any to any"
    );

    rule.set_protocol(Protocol(254));
    assert_eq!(
        rule.to_pf_conf(&table).unwrap(),
        "pass in proto Protocol(254) from any to any"
    );
}

#[test]
fn test_config_selects_protocol_file() {
    let (dir, protocols) = write_temp("protocols", PROTOCOLS);
    let config_path = dir.path().join("config.json");

    let app_config = AppConfig {
        protocols_file: protocols,
        load_system_protocols: true,
    };
    config::save_config(&app_config, &config_path).unwrap();

    let loaded = config::load_config(Some(config_path.as_path())).unwrap();
    let table = loaded.protocol_table();
    assert_eq!(table.lookup(Protocol(50)), "esp");

    let builtin = AppConfig {
        load_system_protocols: false,
        ..loaded
    };
    assert_eq!(builtin.protocol_table().lookup(Protocol(50)), "Protocol(50)");
}

#[test]
fn test_rule_survives_document_roundtrip() {
    let mut rule = Rule::new();
    rule.set_action(Action::Pass);
    rule.set_protocol(Protocol::TCP);
    rule.set_log_user(true);
    rule.set_log(true);
    rule.set_source(AddressMatch::new(Address::Interface {
        name: "em0".into(),
        mode: pfrule::core::address::InterfaceMode::Network,
        no_alias: false,
    }));
    rule.set_destination(AddressMatch::any_port(PortMatch::new(PortOp::Ge, 1024, 0)));
    rule.set_flags(FlagSet::new(TcpFlags::SYN, TcpFlags::SYN | TcpFlags::ACK | TcpFlags::FIN));

    let mut ruleset = RuleSet::new();
    ruleset.rules.push(rule);
    let json = serde_json::to_string_pretty(&ruleset).unwrap();
    let back = RuleSet::from_json(&json).unwrap();

    let table = ProtocolTable::new();
    assert_eq!(
        back.to_pf_conf(&table).unwrap(),
        ruleset.to_pf_conf(&table).unwrap()
    );
    assert_eq!(
        back.to_pf_conf(&table).unwrap(),
        "pass log (user) proto tcp from (em0:network) to any port >=1024 flags S/FSA"
    );
}

#[test]
fn test_inconsistent_port_clause_is_internal_error() {
    let (_dir, path) = write_temp(
        "rules.json",
        r#"{ "rules": [ { "destination": { "port": { "op": "none", "low": 80 } } } ] }"#,
    );
    let ruleset = RuleSet::load(&path).unwrap();
    let err = ruleset.to_pf_conf(&ProtocolTable::new()).unwrap_err();
    assert!(err.is_internal());
    assert!(matches!(err, Error::InvalidPortOperator { low: 80, .. }));
}

#[test]
fn test_missing_ruleset_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RuleSet::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
