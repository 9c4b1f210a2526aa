//! Key/value persistence scoped per mod
//!
//! Features:
//! - `PersistenceStore`: existence check plus JSON read/write per (mod, key)
//! - `TypedStore`: the typed `write::<T>` / `read::<T>` family every store gets
//! - `MemoryStore`: in-process store, nothing touches disk
//! - `JsonFileStore`: one JSON file per mod, temp file + rename on save

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;
use crate::identity::OwnerRecord;

/// Store of JSON values keyed by owner and key
pub trait PersistenceStore: Send + Sync {
    /// Whether `key` was written; fails when the mod's saves can't be loaded
    fn try_exists(&self, owner: &OwnerRecord, key: &str) -> Result<bool, StoreError>;

    /// Like [`try_exists`](Self::try_exists), load failures logged and read as `false`
    fn exists(&self, owner: &OwnerRecord, key: &str) -> bool {
        self.try_exists(owner, key).unwrap_or_else(|e| {
            log::error!("Could not check `{}` for mod `{}`: {}", key, owner.mod_id(), e);
            false
        })
    }

    fn write_json(&self, owner: &OwnerRecord, key: &str, value: Value) -> Result<(), StoreError>;

    /// `Ok(None)` when the key was never written
    fn read_json(&self, owner: &OwnerRecord, key: &str) -> Result<Option<Value>, StoreError>;
}

/// Typed operations available on every store
pub trait TypedStore {
    /// Fails with `Unrepresentable` when the JSON form would not read back as `T`
    fn write<T: Serialize + DeserializeOwned>(&self, owner: &OwnerRecord, key: &str, value: &T) -> Result<(), StoreError>;

    fn read<T: DeserializeOwned>(&self, owner: &OwnerRecord, key: &str) -> Result<T, StoreError>;
}

impl<S: PersistenceStore + ?Sized> TypedStore for S {
    fn write<T: Serialize + DeserializeOwned>(&self, owner: &OwnerRecord, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        // NaN and infinities serialize as null
        if contains_null(&json) && serde_json::from_value::<T>(json.clone()).is_err() {
            log::error!("Refusing to save `{}` for mod `{}`: not representable in JSON", key, owner.mod_id());
            return Err(StoreError::Unrepresentable {
                key: key.to_string(),
                type_name: std::any::type_name::<T>(),
            });
        }
        self.write_json(owner, key, json)
    }

    fn read<T: DeserializeOwned>(&self, owner: &OwnerRecord, key: &str) -> Result<T, StoreError> {
        let json = self
            .read_json(owner, key)?
            .ok_or_else(|| StoreError::Missing(key.to_string()))?;
        serde_json::from_value(json).map_err(|source| StoreError::Decode {
            key: key.to_string(),
            type_name: std::any::type_name::<T>(),
            source,
        })
    }
}

fn contains_null(json: &Value) -> bool {
    match json {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(fields) => fields.values().any(contains_null),
        _ => false,
    }
}
