use thiserror::Error;

/// Core error types for pfrule
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A port match reached the renderer with bounds but no usable operator.
    ///
    /// This is a caller bug: the record was populated inconsistently.
    #[error("Internal error: port operation unknown: {op} ({low}:{high})")]
    InvalidPortOperator { op: u8, low: u16, high: u16 },

    /// Raw port operator code outside the kernel enumeration
    #[error("Unknown port operator code: {0}")]
    UnknownPortOperator(u8),

    /// Raw enum code (action, direction, state) outside its kernel enumeration
    #[error("Unknown {kind} code: {code}")]
    UnknownCode { kind: &'static str, code: u8 },

    /// Rule set exceeds [`crate::core::firewall::MAX_RULES`]
    #[error("Rule set has {count} rules, maximum is {max}")]
    TooManyRules { count: usize, max: usize },

    /// Configuration present but unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for errors caused by inconsistent data reaching the renderer.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::InvalidPortOperator { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
