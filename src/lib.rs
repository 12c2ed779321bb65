//! pfrule - packet filter rule model and renderer
//!
//! Models a single packet filter rule as the kernel holds it and renders it
//! back into its canonical configuration line.
//!
//! # Architecture
//!
//! - [`core`] - Rule data model, protocol names, and the renderer
//! - [`config`] - Configuration persistence
//! - [`utils`] - Utility functions (XDG directories)
//!
//! Submitting rules to the kernel and parsing configuration text are left to
//! the caller; this crate only goes from a populated [`Rule`] to text.

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export commonly used types
pub use crate::core::error::{Error, Result};
pub use crate::core::firewall::{Rule, RuleSet};
pub use crate::core::protocol::{Protocol, ProtocolTable};
pub use crate::core::render::render_rule;
