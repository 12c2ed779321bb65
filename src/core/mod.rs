//! Core packet filter rule functionality
//!
//! This module contains the rule data model and the renderer that turns a
//! populated rule into configuration text. It provides:
//!
//! - [`firewall`]: The [`firewall::Rule`] record, its enums and [`firewall::RuleSet`]
//! - [`address`]: Address specifications for the `from`/`to` sides
//! - [`port`]: Port operators and bounds
//! - [`flags`]: TCP flag matching
//! - [`protocol`]: Protocol numbers and the injected name table
//! - [`render`]: Rule → configuration text
//! - [`error`]: Error types for rule operations

pub mod address;
pub mod error;
pub mod firewall;
pub mod flags;
pub mod port;
pub mod protocol;
pub mod render;

#[cfg(test)]
pub mod test_helpers;
