//! TCP flag matching
//!
//! A rule matches TCP control bits as `flags <set>/<out_of>`: of the bits in
//! `out_of`, exactly those in `set` must be on. An empty `out_of` means any
//! combination of flags is accepted.

use serde::{Deserialize, Serialize};
use std::fmt;

bitflags::bitflags! {
    /// TCP header control bits, in header bit order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TcpFlags: u8 {
        const FIN = 0x01;
        const SYN = 0x02;
        const RST = 0x04;
        const PSH = 0x08;
        const ACK = 0x10;
        const URG = 0x20;
        const ECE = 0x40;
        const CWR = 0x80;
    }
}

impl TcpFlags {
    /// Single-letter code used by the configuration language.
    ///
    /// Only meaningful for a single flag; combined values return `'?'`.
    pub const fn letter(self) -> char {
        match self.bits() {
            0x01 => 'F',
            0x02 => 'S',
            0x04 => 'R',
            0x08 => 'P',
            0x10 => 'A',
            0x20 => 'U',
            0x40 => 'E',
            0x80 => 'W',
            _ => '?',
        }
    }

    /// Renders the contained flags as letters in canonical FSRPAUEW order.
    pub fn letters(self) -> String {
        self.iter().map(TcpFlags::letter).collect()
    }
}

/// Required TCP flags (`set`) out of the considered flags (`out_of`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FlagSet {
    #[serde(default)]
    pub set: TcpFlags,
    #[serde(default)]
    pub out_of: TcpFlags,
}

impl FlagSet {
    pub const fn new(set: TcpFlags, out_of: TcpFlags) -> Self {
        Self { set, out_of }
    }

    /// The implicit filter of a stateful rule, `flags S/SA`.
    pub const fn syn_ack() -> Self {
        Self {
            set: TcpFlags::SYN,
            out_of: TcpFlags::SYN.union(TcpFlags::ACK),
        }
    }

    /// Returns whether any TCP flags are accepted.
    pub const fn any(&self) -> bool {
        self.out_of.is_empty()
    }

    /// Returns whether this is exactly the `S/SA` default of stateful rules.
    pub fn is_default(&self) -> bool {
        *self == Self::syn_ack()
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.any() {
            return write!(f, "flags any");
        }
        write!(f, "flags {}/{}", self.set.letters(), self.out_of.letters())
    }
}
