//! In-memory store, used by tests and by mods that don't need saves on disk

use dashmap::DashMap;
use serde_json::Value;

use super::PersistenceStore;
use crate::error::StoreError;
use crate::identity::OwnerRecord;

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<(String, String), Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values across all mods
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn slot(owner: &OwnerRecord, key: &str) -> (String, String) {
        (owner.mod_id().to_string(), key.to_string())
    }
}

impl PersistenceStore for MemoryStore {
    fn try_exists(&self, owner: &OwnerRecord, key: &str) -> Result<bool, StoreError> {
        Ok(self.values.contains_key(&Self::slot(owner, key)))
    }

    fn write_json(&self, owner: &OwnerRecord, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.insert(Self::slot(owner, key), value);
        Ok(())
    }

    fn read_json(&self, owner: &OwnerRecord, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .values
            .get(&Self::slot(owner, key))
            .map(|entry| entry.value().clone()))
    }
}
