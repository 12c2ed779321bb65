//! Transport port matching
//!
//! A [`PortMatch`] holds an operator and up to two host-order bounds. The
//! all-zero bounds mean "no port constraint" regardless of the operator.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Port comparison operator, numbered like the kernel enumeration.
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
pub enum PortOp {
    /// No port restriction
    #[default]
    None,
    /// `low><high`: strictly between the bounds
    RangeExclusive,
    /// `low`
    Eq,
    /// `!=low`
    Ne,
    /// `<low`
    Lt,
    /// `<=low`
    Le,
    /// `>low`
    Gt,
    /// `>=low`
    Ge,
    /// `low<>high`: outside the bounds
    RangeComplement,
    /// `low:high`: bounds included
    RangeInclusive,
}

impl PortOp {
    /// Kernel operator code.
    pub const fn code(self) -> u8 {
        match self {
            PortOp::None => 0,
            PortOp::RangeExclusive => 1,
            PortOp::Eq => 2,
            PortOp::Ne => 3,
            PortOp::Lt => 4,
            PortOp::Le => 5,
            PortOp::Gt => 6,
            PortOp::Ge => 7,
            PortOp::RangeComplement => 8,
            PortOp::RangeInclusive => 9,
        }
    }
}

impl TryFrom<u8> for PortOp {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0 => PortOp::None,
            1 => PortOp::RangeExclusive,
            2 => PortOp::Eq,
            3 => PortOp::Ne,
            4 => PortOp::Lt,
            5 => PortOp::Le,
            6 => PortOp::Gt,
            7 => PortOp::Ge,
            8 => PortOp::RangeComplement,
            9 => PortOp::RangeInclusive,
            other => return Err(Error::UnknownPortOperator(other)),
        })
    }
}

/// Port operator with its bounds, in host byte order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct PortMatch {
    #[serde(default)]
    pub op: PortOp,
    #[serde(default)]
    pub low: u16,
    #[serde(default)]
    pub high: u16,
}

impl PortMatch {
    pub const fn new(op: PortOp, low: u16, high: u16) -> Self {
        Self { op, low, high }
    }

    /// Matches exactly one port.
    pub const fn single(port: u16) -> Self {
        Self::new(PortOp::Eq, port, 0)
    }

    /// Matches `low` through `high`, both included.
    pub const fn range(low: u16, high: u16) -> Self {
        Self::new(PortOp::RangeInclusive, low, high)
    }

    /// Builds a match from the raw operator code and network-order bounds
    /// as they appear in the kernel structure.
    pub fn from_wire(op: u8, low_be: u16, high_be: u16) -> Result<Self> {
        Ok(Self::new(
            PortOp::try_from(op)?,
            u16::from_be(low_be),
            u16::from_be(high_be),
        ))
    }

    /// True when no port constraint is present.
    pub const fn is_unset(&self) -> bool {
        self.low == 0 && self.high == 0
    }

    /// Operator token following the `port` keyword, or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPortOperator`] when bounds are set but the
    /// operator is [`PortOp::None`].
    pub fn operand(&self) -> Result<Option<String>> {
        if self.is_unset() {
            return Ok(None);
        }

        let (low, high) = (self.low, self.high);
        let def = match self.op {
            PortOp::RangeInclusive => format!("{low}:{high}"),
            PortOp::RangeExclusive => format!("{low}><{high}"),
            PortOp::Eq => low.to_string(),
            PortOp::Ne => format!("!={low}"),
            PortOp::Lt => format!("<{low}"),
            PortOp::Le => format!("<={low}"),
            PortOp::Gt => format!(">{low}"),
            PortOp::Ge => format!(">={low}"),
            PortOp::RangeComplement => format!("{low}<>{high}"),
            PortOp::None => {
                return Err(Error::InvalidPortOperator {
                    op: self.op.code(),
                    low,
                    high,
                });
            }
        };
        Ok(Some(def))
    }

    /// Appends `port <operand>` to `out`, or nothing when unset.
    pub(crate) fn write_tokens(&self, out: &mut Vec<String>) -> Result<()> {
        if let Some(def) = self.operand()? {
            out.push("port".to_string());
            out.push(def);
        }
        Ok(())
    }
}
