use crate::core::error::{Error, Result};
use crate::core::protocol::{ProtocolTable, SYSTEM_PROTOCOLS_PATH};
use crate::utils::default_config_path;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Protocol database used to name protocol numbers
    #[serde(default = "default_protocols_file")]
    pub protocols_file: PathBuf,
    /// Enrich the built-in protocol names from `protocols_file`
    #[serde(default = "default_true")]
    pub load_system_protocols: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            protocols_file: default_protocols_file(),
            load_system_protocols: true,
        }
    }
}

fn default_protocols_file() -> PathBuf {
    PathBuf::from(SYSTEM_PROTOCOLS_PATH)
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Builds the protocol table this configuration asks for.
    pub fn protocol_table(&self) -> ProtocolTable {
        if self.load_system_protocols {
            ProtocolTable::system(&self.protocols_file)
        } else {
            ProtocolTable::new()
        }
    }
}

/// Loads the config from `path`, or from the XDG config directory.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns `Err` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(AppConfig::default()),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(json) => {
            let config = serde_json::from_str(&json)?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Saves the config using an atomic write pattern.
/// 1. Writes to a temporary file in the target directory.
/// 2. Flushes it to disk.
/// 3. Atomically renames it over the target path.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Config(format!("{} has no parent directory", path.display())))?;
    let json = serde_json::to_string_pretty(config)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(json.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(dir.path().join("absent.json").as_path())).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.protocols_file, PathBuf::from("/etc/protocols"));
        assert!(config.load_system_protocols);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "load_system_protocols": false }"#).unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert!(!config.load_system_protocols);
        assert_eq!(config.protocols_file, PathBuf::from("/etc/protocols"));
        assert_eq!(config.protocol_table().len(), 4);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_config(Some(path.as_path())),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = AppConfig {
            protocols_file: dir.path().join("protocols"),
            load_system_protocols: false,
        };
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(Some(path.as_path())).unwrap(), config);
    }
}
