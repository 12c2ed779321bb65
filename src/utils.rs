//! Utility functions for directory management
//!
//! Follows the XDG Base Directory specification for portable configuration
//! storage across Linux distributions.
//!
//! # Directory Structure
//!
//! - Config: `~/.config/pfrule/` - User configuration (`config.json`)

use directories::ProjectDirs;
use std::path::PathBuf;

pub fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "pfrule", "pfrule").map(|pd| pd.config_dir().to_path_buf())
}

/// Default location of the configuration file
pub fn default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|mut dir| {
        dir.push("config.json");
        dir
    })
}
