//! Packet filter rule data structures
//!
//! This module defines the in-memory form of a single packet filter rule as
//! the kernel keeps it, and a [`RuleSet`] document holding many of them.
//!
//! # Rule Structure
//!
//! A [`Rule`] carries:
//! - Action (pass, block, and the translation/scrub actions)
//! - Direction (in, out, or both)
//! - Quick evaluation and logging configuration
//! - Address family and IP protocol
//! - Source and destination [`AddressMatch`] values with port clauses
//! - State tracking mode and TCP [`FlagSet`]
//! - Evaluation, packet and byte counters
//!
//! Logging options and return options are packed into shared bit words, the
//! way the kernel stores them. Every setter touches only its own bit.
//!
//! # Limits
//!
//! Rule sets are limited to [`MAX_RULES`] rules to prevent memory exhaustion.
//!
//! # Example
//!
//! ```
//! use pfrule::core::address::AddressMatch;
//! use pfrule::core::firewall::{Action, Rule, State};
//! use pfrule::core::flags::FlagSet;
//! use pfrule::core::port::PortMatch;
//! use pfrule::core::protocol::{Protocol, ProtocolTable};
//!
//! let mut rule = Rule::new();
//! rule.set_action(Action::Pass);
//! rule.set_protocol(Protocol::TCP);
//! rule.set_destination(AddressMatch::any_port(PortMatch::single(22)));
//! rule.set_state(State::Keep);
//! rule.set_flags(FlagSet::syn_ack());
//!
//! let text = rule.to_pf_conf(&ProtocolTable::new()).unwrap();
//! assert_eq!(text, "pass proto tcp from any to any port 22 keep state");
//! ```

use crate::core::address::AddressMatch;
use crate::core::error::{Error, Result};
use crate::core::flags::FlagSet;
use crate::core::protocol::{Protocol, ProtocolTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum number of rules allowed in a single rule set
///
/// Checked after the document is parsed, so it bounds the rendered output,
/// not the memory used while reading.
pub const MAX_RULES: usize = 1000;

/// What happens to a packet matching the rule
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Let the packet through
    #[default]
    #[strum(serialize = "pass")]
    Pass,
    /// Block the packet
    #[strum(serialize = "drop")]
    Drop,
    #[strum(serialize = "scrub")]
    Scrub,
    #[strum(serialize = "no scrub")]
    NoScrub,
    #[strum(serialize = "nat")]
    Nat,
    #[strum(serialize = "no nat")]
    NoNat,
    #[strum(serialize = "binat")]
    Binat,
    #[strum(serialize = "no binat")]
    NoBinat,
    #[strum(serialize = "rdr")]
    Rdr,
    #[strum(serialize = "no rdr")]
    NoRdr,
    /// Kernel-internal; the rendered keyword is not accepted by pfctl.
    #[strum(serialize = "synproxy drop")]
    SynproxyDrop,
    #[strum(serialize = "defer")]
    Defer,
    #[strum(serialize = "match")]
    Match,
}

impl Action {
    /// Configuration keyword of the action
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Pass => "pass",
            Action::Drop => "drop",
            Action::Scrub => "scrub",
            Action::NoScrub => "no scrub",
            Action::Nat => "nat",
            Action::NoNat => "no nat",
            Action::Binat => "binat",
            Action::NoBinat => "no binat",
            Action::Rdr => "rdr",
            Action::NoRdr => "no rdr",
            Action::SynproxyDrop => "synproxy drop",
            Action::Defer => "defer",
            Action::Match => "match",
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0 => Action::Pass,
            1 => Action::Drop,
            2 => Action::Scrub,
            3 => Action::NoScrub,
            4 => Action::Nat,
            5 => Action::NoNat,
            6 => Action::Binat,
            7 => Action::NoBinat,
            8 => Action::Rdr,
            9 => Action::NoRdr,
            10 => Action::SynproxyDrop,
            11 => Action::Defer,
            12 => Action::Match,
            code => {
                return Err(Error::UnknownCode {
                    kind: "action",
                    code,
                });
            }
        })
    }
}

/// Traffic direction matched by the rule
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Both directions; never written out
    #[default]
    #[strum(serialize = "inout")]
    InOut,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "out")]
    Out,
}

impl TryFrom<u8> for Direction {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Direction::InOut),
            1 => Ok(Direction::In),
            2 => Ok(Direction::Out),
            code => Err(Error::UnknownCode {
                kind: "direction",
                code,
            }),
        }
    }
}

/// Address family the rule applies to
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum AddressFamily {
    #[default]
    #[strum(serialize = "any")]
    Any,
    #[strum(serialize = "inet")]
    Inet,
    #[strum(serialize = "inet6")]
    Inet6,
}

/// Connection state tracking mode
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum State {
    #[default]
    #[strum(serialize = "no state")]
    No,
    #[strum(serialize = "keep state")]
    Keep,
    /// Keep state and randomize TCP initial sequence numbers
    #[strum(serialize = "modulate state")]
    Modulate,
    /// Keep state and proxy the TCP handshake
    #[strum(serialize = "synproxy state")]
    Synproxy,
}

impl TryFrom<u8> for State {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(State::No),
            1 => Ok(State::Keep),
            2 => Ok(State::Modulate),
            3 => Ok(State::Synproxy),
            code => Err(Error::UnknownCode {
                kind: "state",
                code,
            }),
        }
    }
}

bitflags::bitflags! {
    /// Logging bits sharing the rule's log byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct LogFlags: u8 {
        const LOG = 0x01;
        const ALL = 0x02;
        const USER = 0x04;
    }
}

bitflags::bitflags! {
    /// Option bits sharing the rule's flag word
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct RuleFlags: u32 {
        const RETURN_RST = 0x0001;
        const RETURN_ICMP = 0x0004;
        const RETURN = 0x0008;
    }
}

/// Counter snapshot of a rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RuleStats {
    pub evaluations: u64,
    pub packets_in: u64,
    pub packets_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// A single packet filter rule.
///
/// Fields are private; use the accessor pairs. Serialized through
/// [`RuleDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RuleDocument", into = "RuleDocument")]
pub struct Rule {
    src: AddressMatch,
    dst: AddressMatch,

    evaluations: u64,
    packets: [u64; 2],
    bytes: [u64; 2],

    rule_flag: RuleFlags,
    action: Action,
    direction: Direction,
    log: LogFlags,
    log_if: u8,
    quick: bool,
    proto: Protocol,
    keep_state: State,
    af: AddressFamily,
    flags: FlagSet,
}

impl Rule {
    /// A `pass from any to any` rule with all options off.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// True if matching stops rule evaluation.
    pub fn quick(&self) -> bool {
        self.quick
    }

    pub fn set_quick(&mut self, enabled: bool) {
        self.quick = enabled;
    }

    /// True if the packet creating a match (or state) is logged.
    pub fn log(&self) -> bool {
        self.log.contains(LogFlags::LOG)
    }

    pub fn set_log(&mut self, enabled: bool) {
        self.log.set(LogFlags::LOG, enabled);
    }

    /// True if, for stateful rules, every packet of the connection is logged.
    pub fn log_all(&self) -> bool {
        self.log.contains(LogFlags::ALL)
    }

    pub fn set_log_all(&mut self, enabled: bool) {
        self.log.set(LogFlags::ALL, enabled);
    }

    /// True if the owning user and group of the socket are logged.
    pub fn log_user(&self) -> bool {
        self.log.contains(LogFlags::USER)
    }

    pub fn set_log_user(&mut self, enabled: bool) {
        self.log.set(LogFlags::USER, enabled);
    }

    /// Index of the pflog interface; 0 means the default interface.
    pub fn log_interface(&self) -> u8 {
        self.log_if
    }

    pub fn set_log_interface(&mut self, index: u8) {
        self.log_if = index;
    }

    pub fn address_family(&self) -> AddressFamily {
        self.af
    }

    pub fn set_address_family(&mut self, af: AddressFamily) {
        self.af = af;
    }

    pub fn protocol(&self) -> Protocol {
        self.proto
    }

    pub fn set_protocol(&mut self, proto: Protocol) {
        self.proto = proto;
    }

    /// True if blocked packets are answered with TCP RST or ICMP unreachable.
    pub fn return_traffic(&self) -> bool {
        self.rule_flag.contains(RuleFlags::RETURN)
    }

    pub fn set_return_traffic(&mut self, enabled: bool) {
        self.rule_flag.set(RuleFlags::RETURN, enabled);
    }

    pub fn return_rst(&self) -> bool {
        self.rule_flag.contains(RuleFlags::RETURN_RST)
    }

    pub fn set_return_rst(&mut self, enabled: bool) {
        self.rule_flag.set(RuleFlags::RETURN_RST, enabled);
    }

    pub fn return_icmp(&self) -> bool {
        self.rule_flag.contains(RuleFlags::RETURN_ICMP)
    }

    pub fn set_return_icmp(&mut self, enabled: bool) {
        self.rule_flag.set(RuleFlags::RETURN_ICMP, enabled);
    }

    pub fn source(&self) -> &AddressMatch {
        &self.src
    }

    pub fn set_source(&mut self, src: AddressMatch) {
        self.src = src;
    }

    pub fn destination(&self) -> &AddressMatch {
        &self.dst
    }

    pub fn set_destination(&mut self, dst: AddressMatch) {
        self.dst = dst;
    }

    pub fn state(&self) -> State {
        self.keep_state
    }

    pub fn set_state(&mut self, state: State) {
        self.keep_state = state;
    }

    /// TCP flags that must be set out of the considered set.
    pub fn flags(&self) -> FlagSet {
        self.flags
    }

    pub fn set_flags(&mut self, flags: FlagSet) {
        self.flags = flags;
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> RuleStats {
        RuleStats {
            evaluations: self.evaluations,
            packets_in: self.packets[0],
            packets_out: self.packets[1],
            bytes_in: self.bytes[0],
            bytes_out: self.bytes[1],
        }
    }

    /// Loads counters read back from the kernel.
    pub fn set_stats(&mut self, stats: RuleStats) {
        self.evaluations = stats.evaluations;
        self.packets = [stats.packets_in, stats.packets_out];
        self.bytes = [stats.bytes_in, stats.bytes_out];
    }

    /// Renders the rule in configuration syntax.
    ///
    /// # Errors
    ///
    /// Fails only when a port clause has bounds but no operator.
    pub fn to_pf_conf(&self, protocols: &ProtocolTable) -> Result<String> {
        crate::core::render::render_rule(self, protocols)
    }
}

/// Serialized shape of a [`Rule`], with packed bits spelled out.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuleDocument {
    pub action: Action,
    #[serde(rename = "return")]
    pub return_traffic: bool,
    pub return_rst: bool,
    pub return_icmp: bool,
    pub direction: Direction,
    pub quick: bool,
    pub log: bool,
    pub log_all: bool,
    pub log_user: bool,
    pub log_interface: u8,
    pub address_family: AddressFamily,
    pub protocol: Protocol,
    pub source: AddressMatch,
    pub destination: AddressMatch,
    pub state: State,
    pub flags: FlagSet,
    pub stats: RuleStats,
}

impl From<RuleDocument> for Rule {
    fn from(doc: RuleDocument) -> Self {
        let mut rule = Rule::new();
        rule.set_action(doc.action);
        rule.set_return_traffic(doc.return_traffic);
        rule.set_return_rst(doc.return_rst);
        rule.set_return_icmp(doc.return_icmp);
        rule.set_direction(doc.direction);
        rule.set_quick(doc.quick);
        rule.set_log(doc.log);
        rule.set_log_all(doc.log_all);
        rule.set_log_user(doc.log_user);
        rule.set_log_interface(doc.log_interface);
        rule.set_address_family(doc.address_family);
        rule.set_protocol(doc.protocol);
        rule.set_source(doc.source);
        rule.set_destination(doc.destination);
        rule.set_state(doc.state);
        rule.set_flags(doc.flags);
        rule.set_stats(doc.stats);
        rule
    }
}

impl From<Rule> for RuleDocument {
    fn from(rule: Rule) -> Self {
        Self {
            action: rule.action(),
            return_traffic: rule.return_traffic(),
            return_rst: rule.return_rst(),
            return_icmp: rule.return_icmp(),
            direction: rule.direction(),
            quick: rule.quick(),
            log: rule.log(),
            log_all: rule.log_all(),
            log_user: rule.log_user(),
            log_interface: rule.log_interface(),
            address_family: rule.address_family(),
            protocol: rule.protocol(),
            stats: rule.stats(),
            state: rule.state(),
            flags: rule.flags(),
            source: rule.src,
            destination: rule.dst,
        }
    }
}

/// Ordered list of rules, as stored in a rule set document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON rule set document.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or more than [`MAX_RULES`] rules.
    pub fn from_json(json: &str) -> Result<Self> {
        let ruleset: RuleSet = serde_json::from_str(json)?;
        if ruleset.rules.len() > MAX_RULES {
            return Err(Error::TooManyRules {
                count: ruleset.rules.len(),
                max: MAX_RULES,
            });
        }
        Ok(ruleset)
    }

    /// Reads and parses a JSON rule set document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Renders every rule, one per line, without a trailing newline.
    pub fn to_pf_conf(&self, protocols: &ProtocolTable) -> Result<String> {
        crate::core::render::render_ruleset(&self.rules, protocols)
    }
}
