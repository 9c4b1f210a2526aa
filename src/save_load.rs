//! Save/load entry points for mods
//!
//! Mods call these without naming themselves: the owning mod is resolved from
//! the call chain, once per call (once per batch for the batched forms).
//! Values are passed as [`Value`] and routed to the store operation for their
//! runtime type. Callers that already hold their [`OwnerRecord`] can skip
//! resolution with [`SaveLoad::for_owner`].
//!
//! A host installs one instance at startup with [`SaveLoad::install`]; mods
//! reach it through [`SaveLoad::global`], so every call site shares one
//! identity cache for the life of the process.
//!
//! ```
//! use std::sync::Arc;
//! use mod_utils::{LoadedMods, MemoryStore, ModRegistration, ModuleId, SaveLoad, SaveLoadConfig, Value};
//!
//! let mut mods = LoadedMods::new();
//! mods.register(ModuleId::from_module_path(module_path!()), ModRegistration::new("Radio", "Radio", "1.0"));
//! let save_load = SaveLoad::from_config(&SaveLoadConfig::default(), Arc::new(mods), Arc::new(MemoryStore::new()));
//!
//! let _frame = mod_utils::call_frame!("on_save");
//! save_load.write_value("volume", Value::new(0.8_f32)).unwrap();
//! assert_eq!(save_load.read::<f32>("volume").unwrap(), Some(0.8));
//! assert_eq!(save_load.read::<f32>("missing").unwrap(), None);
//! ```

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::SaveLoadConfig;
use crate::dispatch::{BatchResults, Dispatcher, Persist, TypeKey, TypeRegistry, Value};
use crate::error::{Result, SaveLoadError};
use crate::identity::{self, CallChain, CallerResolver, FrameGuard, ModuleRegistry, OwnerRecord, ScopedCallChain};
use crate::persistence::{PersistenceStore, TypedStore};

static GLOBAL: OnceCell<SaveLoad> = OnceCell::new();

pub struct SaveLoad {
    resolver: CallerResolver,
    dispatcher: Dispatcher,
}

impl SaveLoad {
    /// Make this instance the process-wide one; only the first install wins
    pub fn install(self) -> Result<&'static SaveLoad> {
        GLOBAL.set(self).map_err(|_| {
            log::warn!("Save/load already installed, keeping the existing instance");
            SaveLoadError::AlreadyInstalled
        })?;
        log::info!("Save/load installed");
        Self::global()
    }

    /// The installed process-wide instance
    pub fn global() -> Result<&'static SaveLoad> {
        GLOBAL.get().ok_or(SaveLoadError::NotInstalled)
    }

    pub fn new(resolver: CallerResolver, dispatcher: Dispatcher) -> Self {
        Self { resolver, dispatcher }
    }

    /// Resolve callers from the thread's scoped call chain, built-in value types
    pub fn from_config(
        config: &SaveLoadConfig,
        mods: Arc<dyn ModuleRegistry>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        Self::with_chain(config, Arc::new(ScopedCallChain), mods, TypeRegistry::with_builtins(), store)
    }

    pub fn with_chain(
        config: &SaveLoadConfig,
        chain: Arc<dyn CallChain>,
        mods: Arc<dyn ModuleRegistry>,
        types: TypeRegistry,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        let resolver = CallerResolver::new(config.library_module(), chain, mods);
        log::info!(
            "Save/load ready: {} value types, skipping frames of `{}`",
            types.len(),
            resolver.library()
        );
        Self::new(resolver, Dispatcher::new(types, store))
    }

    pub fn resolver(&self) -> &CallerResolver {
        &self.resolver
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Owner record of the calling mod
    pub fn current_owner(&self) -> Result<Arc<OwnerRecord>> {
        let _frame = self.enter("current_owner");
        self.resolver.resolve()
    }

    /// Operate on behalf of a known owner, no call-chain lookup
    pub fn for_owner(&self, owner: Arc<OwnerRecord>) -> OwnerScope<'_> {
        OwnerScope {
            dispatcher: &self.dispatcher,
            owner,
        }
    }

    /// Whether the calling mod has a value saved under `key`
    pub fn exists(&self, key: &str) -> Result<bool> {
        self.caller("exists")?.exists(key)
    }

    /// Save a value of any registered type for the calling mod
    pub fn write_value(&self, key: &str, value: Value) -> Result<()> {
        self.caller("write_value")?.write_value(key, &value)
    }

    /// Save a statically typed value for the calling mod
    ///
    /// Goes straight to the store, so `T` doesn't need to be registered.
    pub fn write<T: Persist>(&self, key: &str, value: T) -> Result<()> {
        self.caller("write")?.write(key, &value)
    }

    /// Load `key` as `target`; `Ok(None)` if the calling mod never saved it
    pub fn read_value(&self, key: &str, target: TypeKey) -> Result<Option<Value>> {
        self.caller("read_value")?.read_value(key, target)
    }

    /// Load `key` as `T`; `Ok(None)` if the calling mod never saved it
    pub fn read<T: Persist>(&self, key: &str) -> Result<Option<T>> {
        self.caller("read")?.read::<T>(key)
    }

    /// Save several values; each element succeeds or fails on its own
    pub fn write_values<K: AsRef<str>>(&self, pairs: &[(K, Value)]) -> Result<BatchResults<()>> {
        Ok(self.caller("write_values")?.write_values(pairs))
    }

    /// Save values from parallel arrays; lengths must match
    pub fn write_values_parallel<K: AsRef<str>>(&self, keys: &[K], values: &[Value]) -> Result<BatchResults<()>> {
        self.caller("write_values_parallel")?.write_values_parallel(keys, values)
    }

    /// Load several values, results aligned with `pairs`
    pub fn read_values<K: AsRef<str>>(&self, pairs: &[(K, TypeKey)]) -> Result<BatchResults<Option<Value>>> {
        Ok(self.caller("read_values")?.read_values(pairs))
    }

    /// Load values from parallel key/type arrays; lengths must match
    pub fn read_values_parallel<K: AsRef<str>>(
        &self,
        keys: &[K],
        targets: &[TypeKey],
    ) -> Result<BatchResults<Option<Value>>> {
        self.caller("read_values_parallel")?.read_values_parallel(keys, targets)
    }

    /// Load several values of one type
    pub fn read_all<T: Persist, K: AsRef<str>>(&self, keys: &[K]) -> Result<BatchResults<Option<T>>> {
        Ok(self.caller("read_all")?.read_all::<T, K>(keys))
    }

    fn enter(&self, symbol: &'static str) -> FrameGuard {
        identity::enter(self.resolver.library().clone(), symbol)
    }

    /// Scope for the calling mod; the library frame stays entered while it lives
    fn caller(&self, symbol: &'static str) -> Result<CallerScope<'_>> {
        let frame = self.enter(symbol);
        let owner = self.resolver.resolve()?;
        Ok(CallerScope {
            scope: self.for_owner(owner),
            _frame: frame,
        })
    }
}

struct CallerScope<'a> {
    scope: OwnerScope<'a>,
    _frame: FrameGuard,
}

impl<'a> std::ops::Deref for CallerScope<'a> {
    type Target = OwnerScope<'a>;

    fn deref(&self) -> &Self::Target {
        &self.scope
    }
}

/// Save/load operations bound to one owner
pub struct OwnerScope<'a> {
    dispatcher: &'a Dispatcher,
    owner: Arc<OwnerRecord>,
}

impl OwnerScope<'_> {
    pub fn owner(&self) -> &Arc<OwnerRecord> {
        &self.owner
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        self.dispatcher.exists(key, &self.owner)
    }

    pub fn write_value(&self, key: &str, value: &Value) -> Result<()> {
        self.dispatcher.write_value(key, value, &self.owner)
    }

    pub fn read_value(&self, key: &str, target: TypeKey) -> Result<Option<Value>> {
        self.dispatcher.read_value(key, target, &self.owner)
    }

    /// Typed write straight through the store, `T` need not be registered
    pub fn write<T: Persist>(&self, key: &str, value: &T) -> Result<()> {
        self.dispatcher.store().write(&self.owner, key, value).inspect_err(|e| {
            log::error!("Saving `{}` for mod `{}` failed: {}", key, self.owner.mod_id(), e)
        })?;
        Ok(())
    }

    /// Typed read straight through the store, `T` need not be registered
    pub fn read<T: Persist>(&self, key: &str) -> Result<Option<T>> {
        let store = self.dispatcher.store();
        let value = store
            .try_exists(&self.owner, key)
            .and_then(|saved| saved.then(|| store.read::<T>(&self.owner, key)).transpose())
            .inspect_err(|e| log::error!("Loading `{}` for mod `{}` failed: {}", key, self.owner.mod_id(), e))?;
        Ok(value)
    }

    pub fn write_values<K: AsRef<str>>(&self, pairs: &[(K, Value)]) -> BatchResults<()> {
        self.dispatcher.write_values(pairs, &self.owner)
    }

    pub fn write_values_parallel<K: AsRef<str>>(&self, keys: &[K], values: &[Value]) -> Result<BatchResults<()>> {
        self.dispatcher.write_values_parallel(keys, values, &self.owner)
    }

    pub fn read_values<K: AsRef<str>>(&self, pairs: &[(K, TypeKey)]) -> BatchResults<Option<Value>> {
        self.dispatcher.read_values(pairs, &self.owner)
    }

    pub fn read_values_parallel<K: AsRef<str>>(
        &self,
        keys: &[K],
        targets: &[TypeKey],
    ) -> Result<BatchResults<Option<Value>>> {
        self.dispatcher.read_values_parallel(keys, targets, &self.owner)
    }

    pub fn read_all<T: Persist, K: AsRef<str>>(&self, keys: &[K]) -> BatchResults<Option<T>> {
        keys.iter().map(|key| self.read::<T>(key.as_ref())).collect()
    }
}
