//! Type → typed store operation table
//!
//! Each registered type gets a pair of monomorphized functions that call the
//! store's `write::<T>` and `read::<T>`. The table is filled at startup and
//! only read afterwards; a missing entry means the store can't be driven for
//! that type and surfaces as `DispatchUnavailable`.

use std::any::TypeId;
use std::collections::HashMap;

use dashmap::DashSet;
use glam::{Quat, Vec2, Vec3, Vec4};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{TypeKey, Value};
use crate::error::{Result, SaveLoadError};
use crate::identity::OwnerRecord;
use crate::persistence::{PersistenceStore, TypedStore};

/// Types the store can persist
pub trait Persist: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T: Serialize + DeserializeOwned + Send + Sync + 'static> Persist for T {}

type WriteFn = fn(&dyn PersistenceStore, &OwnerRecord, &str, &Value) -> Result<()>;
type ReadFn = fn(&dyn PersistenceStore, &OwnerRecord, &str) -> Result<Value>;

/// Store operations bound to one value type
#[derive(Clone, Copy)]
pub struct TypedOps {
    key: TypeKey,
    write: WriteFn,
    read: ReadFn,
}

impl TypedOps {
    pub fn of<T: Persist>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            write: write_as::<T>,
            read: read_as::<T>,
        }
    }

    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    pub fn write(&self, store: &dyn PersistenceStore, owner: &OwnerRecord, key: &str, value: &Value) -> Result<()> {
        (self.write)(store, owner, key, value)
    }

    pub fn read(&self, store: &dyn PersistenceStore, owner: &OwnerRecord, key: &str) -> Result<Value> {
        (self.read)(store, owner, key)
    }
}

impl std::fmt::Debug for TypedOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedOps").field("type", &self.key.name()).finish()
    }
}

fn write_as<T: Persist>(store: &dyn PersistenceStore, owner: &OwnerRecord, key: &str, value: &Value) -> Result<()> {
    let typed = value.downcast_ref::<T>().ok_or(SaveLoadError::DispatchUnavailable {
        op: "write",
        type_name: std::any::type_name::<T>(),
    })?;
    Ok(store.write::<T>(owner, key, typed)?)
}

fn read_as<T: Persist>(store: &dyn PersistenceStore, owner: &OwnerRecord, key: &str) -> Result<Value> {
    let typed = store.read::<T>(owner, key)?;
    Ok(Value::new(typed))
}

/// Operation table keyed by runtime type
#[derive(Debug, Default)]
pub struct TypeRegistry {
    ops: HashMap<TypeId, TypedOps>,
    reported: DashSet<(&'static str, TypeId)>,
}

impl TypeRegistry {
    /// Empty table, nothing can be dispatched
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the value types mods commonly save
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register::<bool>()
            .register::<i32>()
            .register::<i64>()
            .register::<u32>()
            .register::<u64>()
            .register::<f32>()
            .register::<f64>()
            .register::<String>()
            .register::<Vec<i32>>()
            .register::<Vec<f32>>()
            .register::<Vec<String>>()
            .register::<Vec2>()
            .register::<Vec3>()
            // Colors are saved as RGBA
            .register::<Vec4>()
            .register::<Quat>();
        registry
    }

    pub fn register<T: Persist>(&mut self) -> &mut Self {
        let ops = TypedOps::of::<T>();
        if self.ops.insert(ops.key.id(), ops).is_some() {
            log::debug!("Type `{}` registered twice", ops.key.name());
        }
        self
    }

    pub fn get(&self, key: TypeKey) -> Option<&TypedOps> {
        self.ops.get(&key.id())
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.ops.contains_key(&key.id())
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operations for `key`, or `DispatchUnavailable`
    ///
    /// Each distinct (operation, type) failure is logged once.
    pub fn bind(&self, op: &'static str, key: TypeKey) -> Result<&TypedOps> {
        self.get(key).ok_or_else(|| {
            if self.reported.insert((op, key.id())) {
                log::error!("Could not find a {} operation for type `{}`", op, key.name());
            }
            SaveLoadError::DispatchUnavailable {
                op,
                type_name: key.name(),
            }
        })
    }

    /// Number of distinct dispatch failures logged so far
    pub fn reported_failures(&self) -> usize {
        self.reported.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ModRegistration, ModuleId};
    use crate::persistence::MemoryStore;

    fn owner() -> OwnerRecord {
        OwnerRecord::new(ModuleId::new("radio"), ModRegistration::new("Radio", "Radio", "1.0"))
    }

    #[test]
    fn test_builtins_registered() {
        let registry = TypeRegistry::with_builtins();
        assert!(registry.contains(TypeKey::of::<f32>()));
        assert!(registry.contains(TypeKey::of::<String>()));
        assert!(registry.contains(TypeKey::of::<Vec3>()));
        assert!(registry.contains(TypeKey::of::<Quat>()));
        assert!(!registry.contains(TypeKey::of::<&str>()));
        assert_eq!(registry.len(), 15);
    }

    #[test]
    fn test_bound_ops_drive_store() {
        let registry = TypeRegistry::with_builtins();
        let store = MemoryStore::new();
        let owner = owner();

        let ops = registry.bind("write", TypeKey::of::<Vec3>()).unwrap();
        ops.write(&store, &owner, "spawn", &Value::new(Vec3::new(1.0, 2.0, 3.0))).unwrap();

        let read = ops.read(&store, &owner, "spawn").unwrap();
        assert_eq!(read.downcast::<Vec3>().unwrap(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_unregistered_type_logged_once() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wheel {
            size: u8,
        }

        let mut registry = TypeRegistry::with_builtins();
        for _ in 0..3 {
            let err = registry.bind("write", TypeKey::of::<Wheel>()).unwrap_err();
            assert!(matches!(err, SaveLoadError::DispatchUnavailable { op: "write", .. }));
        }
        assert_eq!(registry.reported_failures(), 1);

        registry.bind("read", TypeKey::of::<Wheel>()).unwrap_err();
        assert_eq!(registry.reported_failures(), 2);

        registry.register::<Wheel>();
        assert!(registry.bind("write", TypeKey::of::<Wheel>()).is_ok());
    }

    #[test]
    fn test_write_rejects_mismatched_value() {
        let ops = TypedOps::of::<i32>();
        let store = MemoryStore::new();
        let err = ops.write(&store, &owner(), "k", &Value::new(1.0_f64)).unwrap_err();
        assert!(matches!(err, SaveLoadError::DispatchUnavailable { type_name: "i32", .. }));
        assert!(store.is_empty());
    }
}
