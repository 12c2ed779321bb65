//! IP protocol numbers and their names
//!
//! The [`ProtocolTable`] is built once, seeded with the four protocols every
//! rule set uses and optionally enriched from a `protocols(5)` style file. It is
//! passed explicitly to the renderer; there is no process-wide table.
//!
//! # Example
//!
//! ```
//! use pfrule::core::protocol::{Protocol, ProtocolTable};
//!
//! let mut table = ProtocolTable::new();
//! let added = table.load_from_reader("gre 47 GRE # generic routing".as_bytes()).unwrap();
//! assert_eq!(added, 1);
//! assert_eq!(table.lookup(Protocol(47)), "gre");
//! assert_eq!(table.lookup(Protocol(254)), "Protocol(254)");
//! ```

use crate::core::error::Result;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Default location of the system protocol database
pub const SYSTEM_PROTOCOLS_PATH: &str = "/etc/protocols";

/// IP protocol number matched by a rule; 0 matches any protocol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct Protocol(pub u8);

impl Protocol {
    pub const ANY: Protocol = Protocol(0);
    pub const ICMP: Protocol = Protocol(1);
    pub const TCP: Protocol = Protocol(6);
    pub const UDP: Protocol = Protocol(17);

    pub const fn is_any(self) -> bool {
        self.0 == 0
    }

    /// True for protocols where TCP flag matching applies (TCP or any).
    pub const fn carries_tcp_flags(self) -> bool {
        self.0 == Self::ANY.0 || self.0 == Self::TCP.0
    }
}

impl From<u8> for Protocol {
    fn from(value: u8) -> Self {
        Protocol(value)
    }
}

/// Mapping from protocol number to canonical name.
#[derive(Debug, Clone)]
pub struct ProtocolTable {
    names: HashMap<u8, String>,
}

impl Default for ProtocolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolTable {
    /// Creates a table seeded with `any`, `icmp`, `tcp` and `udp`.
    pub fn new() -> Self {
        let mut table = Self::empty();
        for (proto, name) in [
            (Protocol::ANY, "any"),
            (Protocol::ICMP, "icmp"),
            (Protocol::TCP, "tcp"),
            (Protocol::UDP, "udp"),
        ] {
            table.insert_if_absent(proto, name);
        }
        table
    }

    /// Creates a table with no names at all.
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    /// Seeded table enriched from `path`.
    ///
    /// A missing file leaves the seed untouched. A read failure part way
    /// through keeps the names loaded before it. Rendering never depends on
    /// the file being present.
    pub fn system(path: &Path) -> Self {
        let mut table = Self::new();
        match table.load_from_file(path) {
            Ok(added) => {
                tracing::debug!("Loaded {} protocol names from {}", added, path.display());
            }
            Err(e) => {
                tracing::warn!(
                    "Protocol names from {} incomplete ({} known): {}",
                    path.display(),
                    table.len(),
                    e
                );
            }
        }
        table
    }

    /// Records `name` for `proto` unless a name is already known.
    ///
    /// Returns true if the name was added.
    pub fn insert_if_absent(&mut self, proto: Protocol, name: &str) -> bool {
        if self.names.contains_key(&proto.0) {
            return false;
        }
        self.names.insert(proto.0, name.to_string());
        true
    }

    /// Reads `name number [aliases...] [# comment]` lines.
    ///
    /// Lines without a usable number, or that are not UTF-8, are skipped. The
    /// first name seen for a number wins, including the seeded names. Returns
    /// the number of names added; only read failures are errors.
    pub fn load_from_reader<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        let mut added = 0;
        for raw in reader.split(b'\n') {
            let raw = raw?;
            let Ok(line) = std::str::from_utf8(&raw) else {
                tracing::debug!("Skipping protocol line that is not UTF-8");
                continue;
            };
            let Some((name, proto)) = parse_line(line) else {
                continue;
            };
            if self.insert_if_absent(proto, name) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Opens `path` and enriches the table from it.
    pub fn load_from_file(&mut self, path: &Path) -> Result<usize> {
        let file = File::open(path)?;
        self.load_from_reader(BufReader::new(file))
    }

    /// Known name for `proto`, if any.
    pub fn name(&self, proto: Protocol) -> Option<&str> {
        self.names.get(&proto.0).map(String::as_str)
    }

    /// Name for `proto`, or a `Protocol(<n>)` placeholder when unknown.
    pub fn lookup(&self, proto: Protocol) -> Cow<'_, str> {
        match self.name(proto) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("Protocol({})", proto.0)),
        }
    }

    /// All known names, ordered by protocol number.
    pub fn iter(&self) -> impl Iterator<Item = (Protocol, &str)> {
        let mut entries: Vec<_> = self
            .names
            .iter()
            .map(|(id, name)| (Protocol(*id), name.as_str()))
            .collect();
        entries.sort_unstable_by_key(|(proto, _)| *proto);
        entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Splits one database line into its name and protocol number.
fn parse_line(line: &str) -> Option<(&str, Protocol)> {
    let line = line.split_once('#').map_or(line, |(data, _)| data);
    let mut fields = line.split_whitespace();
    let name = fields.next()?;
    let number = fields.next()?.parse::<u8>().ok()?;
    Some((name, Protocol(number)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Internet (IP) protocols
ip\t0\tIP\t\t# internet protocol, pseudo protocol number
icmp\t1\tICMP\t\t# internet control message protocol
igmp 2 IGMP
tcp\t6\tTCP
udp\t17\tUDP
gre  47  GRE    # General Routing Encapsulation
ipv6-icmp 58 IPv6-ICMP
icmp6 58
broken
junk x
big 300 BIG
";

    #[test]
    fn test_seeded_names() {
        let table = ProtocolTable::new();
        assert_eq!(table.len(), 4);
        assert_eq!(table.lookup(Protocol::ANY), "any");
        assert_eq!(table.lookup(Protocol::ICMP), "icmp");
        assert_eq!(table.lookup(Protocol::TCP), "tcp");
        assert_eq!(table.lookup(Protocol::UDP), "udp");
    }

    #[test]
    fn test_unknown_protocol_placeholder() {
        let table = ProtocolTable::new();
        assert_eq!(table.lookup(Protocol(254)), "Protocol(254)");
        assert!(table.name(Protocol(254)).is_none());
    }

    #[test]
    fn test_enrichment_keeps_first_name() {
        let mut table = ProtocolTable::new();
        let added = table.load_from_reader(SAMPLE.as_bytes()).unwrap();

        // igmp, gre, ipv6-icmp; ip/icmp/tcp/udp collide with the seed
        assert_eq!(added, 3);
        assert_eq!(table.lookup(Protocol::ANY), "any");
        assert_eq!(table.lookup(Protocol(2)), "igmp");
        assert_eq!(table.lookup(Protocol(47)), "gre");
        assert_eq!(table.lookup(Protocol(58)), "ipv6-icmp");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let mut table = ProtocolTable::empty();
        let added = table
            .load_from_reader("broken\n\n   \n# only comment\njunk x\nbig 300\nok 9 # c\n".as_bytes())
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(table.lookup(Protocol(9)), "ok");
    }

    #[test]
    fn test_non_utf8_line_is_skipped() {
        let mut table = ProtocolTable::empty();
        let added = table
            .load_from_reader(&b"gre 47 GRE\nigmp 2 IGMP # caf\xe9\nesp 50 ESP\n"[..])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(table.lookup(Protocol(47)), "gre");
        assert_eq!(table.lookup(Protocol(2)), "Protocol(2)");
        assert_eq!(table.lookup(Protocol(50)), "esp");
    }

    #[test]
    fn test_crlf_lines() {
        let mut table = ProtocolTable::empty();
        table.load_from_reader(&b"gre 47 GRE\r\nesp\t50\r\n"[..]).unwrap();
        assert_eq!(table.lookup(Protocol(50)), "esp");
    }

    #[test]
    fn test_iter_is_ordered() {
        let mut table = ProtocolTable::new();
        table.insert_if_absent(Protocol(47), "gre");
        table.insert_if_absent(Protocol(2), "igmp");
        let ids: Vec<u8> = table.iter().map(|(p, _)| p.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 6, 17, 47]);
    }

    #[test]
    fn test_missing_system_file_keeps_seed() {
        let table = ProtocolTable::system(Path::new("/nonexistent/protocols"));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_tcp_flag_protocols() {
        assert!(Protocol::ANY.carries_tcp_flags());
        assert!(Protocol::TCP.carries_tcp_flags());
        assert!(!Protocol::UDP.carries_tcp_flags());
        assert!(!Protocol::ICMP.carries_tcp_flags());
    }
}
