//! Shared test utilities for core module tests
//!
//! Provides common rule fixtures to avoid duplication across test suites.
//! This module is only compiled in test mode.

use crate::core::address::AddressMatch;
use crate::core::firewall::{Action, Direction, Rule, State};
use crate::core::flags::FlagSet;
use crate::core::port::PortMatch;
use crate::core::protocol::Protocol;

/// Creates a stateful TCP pass rule to the given destination port.
///
/// Flags are the implicit `S/SA`, so they do not appear in the output.
pub fn create_stateful_tcp_rule(port: u16) -> Rule {
    let mut rule = Rule::new();
    rule.set_action(Action::Pass);
    rule.set_protocol(Protocol::TCP);
    rule.set_destination(AddressMatch::any_port(PortMatch::single(port)));
    rule.set_state(State::Keep);
    rule.set_flags(FlagSet::syn_ack());
    rule
}

/// Creates a quick, logged inbound block rule.
///
/// # Arguments
///
/// * `return_traffic` - Answer with RST/unreachable instead of dropping
/// * `log_interface` - pflog interface index, 0 for the default
pub fn create_block_rule(return_traffic: bool, log_interface: u8) -> Rule {
    let mut rule = Rule::new();
    rule.set_action(Action::Drop);
    rule.set_return_traffic(return_traffic);
    rule.set_direction(Direction::In);
    rule.set_quick(true);
    rule.set_log(true);
    rule.set_log_interface(log_interface);
    rule
}
