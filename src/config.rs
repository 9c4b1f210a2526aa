//! Save/load configuration
//!
//! Read from a JSON file next to the mod loader; anything missing falls back
//! to the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::error::ConfigError;
use crate::identity::ModuleId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveLoadConfig {
    /// Directory holding one save file per mod
    pub save_dir: PathBuf,
    /// Extension appended to the mod ID to form the file name
    pub file_suffix: String,
    /// Indent save files (easier to inspect, bigger on disk)
    pub pretty_json: bool,
    /// Crate name whose frames are skipped when looking for the caller
    pub library_module: String,
}

impl Default for SaveLoadConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from(consts::DEFAULT_SAVE_DIR),
            file_suffix: consts::SAVE_FILE_SUFFIX.to_string(),
            pretty_json: false,
            library_module: consts::LIBRARY_MODULE.to_string(),
        }
    }
}

impl SaveLoadConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        log::info!("Loaded save/load config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if given and readable, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default save/load config");
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn library_module(&self) -> ModuleId {
        ModuleId::new(self.library_module.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SaveLoadConfig::default();
        assert_eq!(config.save_dir, PathBuf::from("Mods/Saves"));
        assert_eq!(config.file_suffix, ".json");
        assert!(!config.pretty_json);
        assert_eq!(config.library_module().as_str(), "mod_utils");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "save_dir": "/tmp/saves", "pretty_json": true }"#).unwrap();

        let config = SaveLoadConfig::load(&path).unwrap();
        assert_eq!(config.save_dir, PathBuf::from("/tmp/saves"));
        assert!(config.pretty_json);
        assert_eq!(config.file_suffix, ".json");
    }

    #[test]
    fn test_bad_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(SaveLoadConfig::load(&path), Err(ConfigError::Parse(_))));
        assert_eq!(SaveLoadConfig::load_or_default(Some(path.as_path())), SaveLoadConfig::default());
        assert!(matches!(
            SaveLoadConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
