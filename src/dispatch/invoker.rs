//! Typed dispatch of save/load calls for an already resolved owner
//!
//! The invoker never resolves owners itself. Batches take one owner and use it
//! for every element; elements run left to right and one failing element does
//! not stop the rest.

use std::sync::Arc;

use super::{TypeKey, TypeRegistry, Value};
use crate::error::{Result, SaveLoadError};
use crate::identity::OwnerRecord;
use crate::persistence::PersistenceStore;

/// Per-element outcome of a batch, in input order
pub type BatchResults<T> = Vec<Result<T>>;

pub struct Dispatcher {
    types: TypeRegistry,
    store: Arc<dyn PersistenceStore>,
}

impl Dispatcher {
    pub fn new(types: TypeRegistry, store: Arc<dyn PersistenceStore>) -> Self {
        Self { types, store }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn store(&self) -> &dyn PersistenceStore {
        self.store.as_ref()
    }

    pub fn exists(&self, key: &str, owner: &OwnerRecord) -> Result<bool> {
        Ok(self.store.try_exists(owner, key)?)
    }

    /// Save `value` under `key` using the store operation for its runtime type
    pub fn write_value(&self, key: &str, value: &Value, owner: &OwnerRecord) -> Result<()> {
        let Some(type_key) = value.type_key() else {
            log::error!("Value for key `{}` of mod `{}` cannot be null", key, owner.mod_id());
            return Err(SaveLoadError::NullValue { key: key.to_string() });
        };
        let ops = self.types.bind("write", type_key)?;
        ops.write(self.store.as_ref(), owner, key, value)
            .inspect_err(|e| log::error!("Saving `{}` for mod `{}` failed: {}", key, owner.mod_id(), e))
    }

    /// Load `key` as `target`; `Ok(None)` if it was never saved
    pub fn read_value(&self, key: &str, target: TypeKey, owner: &OwnerRecord) -> Result<Option<Value>> {
        let saved = self
            .store
            .try_exists(owner, key)
            .inspect_err(|e| log::error!("Loading `{}` for mod `{}` failed: {}", key, owner.mod_id(), e))?;
        if !saved {
            return Ok(None);
        }
        let ops = self.types.bind("read", target)?;
        ops.read(self.store.as_ref(), owner, key)
            .map(Some)
            .inspect_err(|e| log::error!("Loading `{}` for mod `{}` failed: {}", key, owner.mod_id(), e))
    }

    pub fn write_values<K: AsRef<str>>(&self, pairs: &[(K, Value)], owner: &OwnerRecord) -> BatchResults<()> {
        pairs
            .iter()
            .map(|(key, value)| self.write_value(key.as_ref(), value, owner))
            .collect()
    }

    /// Batch write from parallel arrays; nothing is written on a length mismatch
    pub fn write_values_parallel<K: AsRef<str>>(
        &self,
        keys: &[K],
        values: &[Value],
        owner: &OwnerRecord,
    ) -> Result<BatchResults<()>> {
        check_lengths(keys.len(), values.len(), "values")?;
        Ok(keys
            .iter()
            .zip(values)
            .map(|(key, value)| self.write_value(key.as_ref(), value, owner))
            .collect())
    }

    pub fn read_values<K: AsRef<str>>(&self, pairs: &[(K, TypeKey)], owner: &OwnerRecord) -> BatchResults<Option<Value>> {
        pairs
            .iter()
            .map(|(key, target)| self.read_value(key.as_ref(), *target, owner))
            .collect()
    }

    pub fn read_values_parallel<K: AsRef<str>>(
        &self,
        keys: &[K],
        targets: &[TypeKey],
        owner: &OwnerRecord,
    ) -> Result<BatchResults<Option<Value>>> {
        check_lengths(keys.len(), targets.len(), "types")?;
        Ok(keys
            .iter()
            .zip(targets)
            .map(|(key, target)| self.read_value(key.as_ref(), *target, owner))
            .collect())
    }
}

fn check_lengths(keys: usize, values: usize, what: &'static str) -> Result<()> {
    if keys != values {
        log::error!("Number of keys ({}) must match number of {} ({})", keys, what, values);
        return Err(SaveLoadError::LengthMismatch { keys, values, what });
    }
    Ok(())
}
