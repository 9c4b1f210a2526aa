//! JSON file store, one save file per mod
//!
//! Layout: `<save_dir>/<mod id><suffix>` holding a single JSON object of
//! key → value. Bytes of the mod ID outside `[A-Za-z0-9._-]` are written as
//! `%XX`, so distinct IDs never share a file. Files are loaded on first access and kept in memory. Every
//! write rewrites the mod's file through a temp file and a rename, so a crash
//! mid-save leaves the previous file intact.

use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use serde_json::{Map, Value};

use super::PersistenceStore;
use crate::config::SaveLoadConfig;
use crate::error::StoreError;
use crate::identity::OwnerRecord;

type SaveFile = Map<String, Value>;

#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    suffix: String,
    pretty: bool,
    files: DashMap<String, SaveFile>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            suffix: crate::consts::SAVE_FILE_SUFFIX.to_string(),
            pretty: false,
            files: DashMap::new(),
        }
    }

    pub fn from_config(config: &SaveLoadConfig) -> Self {
        Self {
            suffix: config.file_suffix.clone(),
            pretty: config.pretty_json,
            ..Self::new(&config.save_dir)
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the save file for a mod ID
    pub fn file_path(&self, mod_id: &str) -> PathBuf {
        let mut name = String::with_capacity(mod_id.len() + self.suffix.len());
        for byte in mod_id.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => name.push(char::from(byte)),
                _ => name.push_str(&format!("%{:02X}", byte)),
            }
        }
        name.push_str(&self.suffix);
        self.dir.join(name)
    }

    fn file_for(&self, owner: &OwnerRecord) -> Result<RefMut<'_, String, SaveFile>, StoreError> {
        let mod_id = owner.mod_id();
        if let Some(file) = self.files.get_mut(mod_id) {
            return Ok(file);
        }
        let loaded = self.load_file(mod_id)?;
        Ok(self.files.entry(mod_id.to_string()).or_insert(loaded))
    }

    fn load_file(&self, mod_id: &str) -> Result<SaveFile, StoreError> {
        let path = self.file_path(mod_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No save file for mod `{}` yet", mod_id);
                return Ok(SaveFile::new());
            }
            Err(e) => return Err(e.into()),
        };
        let file: SaveFile = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loaded {} saved values for mod `{}`", file.len(), mod_id);
        Ok(file)
    }

    fn save_file(&self, mod_id: &str, file: &SaveFile) -> Result<(), StoreError> {
        let path = self.file_path(mod_id);
        let json = if self.pretty {
            serde_json::to_vec_pretty(file)
        } else {
            serde_json::to_vec(file)
        }
        .map_err(|source| StoreError::Encode {
            key: mod_id.to_string(),
            source,
        })?;

        fs::create_dir_all(&self.dir)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        log::debug!("Saved {} values for mod `{}`", file.len(), mod_id);
        Ok(())
    }
}

impl PersistenceStore for JsonFileStore {
    fn try_exists(&self, owner: &OwnerRecord, key: &str) -> Result<bool, StoreError> {
        Ok(self.file_for(owner)?.contains_key(key))
    }

    fn write_json(&self, owner: &OwnerRecord, key: &str, value: Value) -> Result<(), StoreError> {
        let mut file = self.file_for(owner)?;
        let previous = file.insert(key.to_string(), value);
        if let Err(e) = self.save_file(owner.mod_id(), &file) {
            // Keep memory in step with disk
            match previous {
                Some(previous) => file.insert(key.to_string(), previous),
                None => file.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn read_json(&self, owner: &OwnerRecord, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.file_for(owner)?.get(key).cloned())
    }
}
