//! Rule-side address specifications
//!
//! [`Address`] is the textual address collaborator: it knows how each kind of
//! address is spelled in a rule. [`AddressMatch`] sequences negation, the
//! address and the trailing port clause.

use crate::core::error::Result;
use crate::core::port::PortMatch;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Which address of a dynamic interface is matched
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
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterfaceMode {
    /// All addresses assigned to the interface
    #[default]
    Address,
    /// The network(s) attached to the interface
    Network,
    /// The broadcast address(es)
    Broadcast,
    /// The peer address(es) of a point-to-point link
    Peer,
}

/// Address representation of one side of a rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Address {
    /// Matches every address
    #[default]
    Any,
    /// A host or CIDR network
    Network(IpNetwork),
    /// An inclusive address range
    Range { from: IpAddr, to: IpAddr },
    /// Addresses of an interface, resolved dynamically
    Interface {
        name: String,
        #[serde(default)]
        mode: InterfaceMode,
        /// Skip alias addresses (`:0`)
        #[serde(default)]
        no_alias: bool,
    },
    /// Addresses held in a named table
    Table(String),
    /// Addresses with no route in the routing table
    NoRoute,
    /// Addresses failing the unicast reverse path check
    UrpfFailed,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Any => write!(f, "any"),
            Address::Network(net) => {
                let host_prefix = if net.is_ipv4() { 32 } else { 128 };
                if net.prefix() == host_prefix {
                    write!(f, "{}", net.ip())
                } else {
                    write!(f, "{}/{}", net.ip(), net.prefix())
                }
            }
            Address::Range { from, to } => write!(f, "{from} - {to}"),
            Address::Interface {
                name,
                mode,
                no_alias,
            } => {
                write!(f, "({name}")?;
                if *mode != InterfaceMode::Address {
                    write!(f, ":{mode}")?;
                }
                if *no_alias {
                    write!(f, ":0")?;
                }
                write!(f, ")")
            }
            Address::Table(name) => write!(f, "<{name}>"),
            Address::NoRoute => write!(f, "no-route"),
            Address::UrpfFailed => write!(f, "urpf-failed"),
        }
    }
}

/// Negation, address and port clause for the `from` or `to` side of a rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AddressMatch {
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub port: PortMatch,
}

impl AddressMatch {
    pub fn new(address: Address) -> Self {
        Self {
            negate: false,
            address,
            port: PortMatch::default(),
        }
    }

    /// Matches any address on the given port clause.
    pub fn any_port(port: PortMatch) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    pub fn with_port(mut self, port: PortMatch) -> Self {
        self.port = port;
        self
    }

    /// Appends `[!] <address> [port <op>]` to `out`.
    pub(crate) fn write_tokens(&self, out: &mut Vec<String>) -> Result<()> {
        if self.negate {
            out.push("!".to_string());
        }
        out.push(self.address.to_string());
        self.port.write_tokens(out)
    }
}
