//! Module identities and the host's registration records

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identity of a code unit (a crate) loaded into the host process
///
/// Cheap to clone; compared by crate name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Identity of the crate that owns a `module_path!()` string
    ///
    /// `my_mod::saves::slot` belongs to `my_mod`.
    pub fn from_module_path(path: &str) -> Self {
        let krate = path.split("::").next().unwrap_or(path);
        Self::new(krate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Host-side registration of a mod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRegistration {
    /// Mod ID, scopes every persisted key
    pub id: String,
    /// Display name
    pub name: String,
    pub version: String,
}

impl ModRegistration {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A module paired with its registration, the owner of saved values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRecord {
    pub module: ModuleId,
    pub registration: ModRegistration,
}

impl OwnerRecord {
    pub fn new(module: ModuleId, registration: ModRegistration) -> Self {
        Self {
            module,
            registration,
        }
    }

    /// Mod ID under which this owner's values are stored
    pub fn mod_id(&self) -> &str {
        &self.registration.id
    }
}

/// Host lookup from module identity to its owner record
pub trait ModuleRegistry: Send + Sync {
    fn find_owner(&self, module: &ModuleId) -> Option<Arc<OwnerRecord>>;
}

/// Mods registered with the loader, built up once at startup
#[derive(Debug, Default)]
pub struct LoadedMods {
    by_module: HashMap<ModuleId, Arc<OwnerRecord>>,
}

impl LoadedMods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mod defined by `module`
    ///
    /// Re-registering the same module replaces the earlier record.
    pub fn register(&mut self, module: impl Into<ModuleId>, registration: ModRegistration) -> Arc<OwnerRecord> {
        let module = module.into();
        let owner = Arc::new(OwnerRecord::new(module.clone(), registration));
        if self.by_module.insert(module.clone(), owner.clone()).is_some() {
            log::warn!("Module `{}` registered twice, keeping the latest record", module);
        }
        owner
    }

    pub fn len(&self) -> usize {
        self.by_module.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_module.is_empty()
    }
}

impl ModuleRegistry for LoadedMods {
    fn find_owner(&self, module: &ModuleId) -> Option<Arc<OwnerRecord>> {
        self.by_module.get(module).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id_from_module_path() {
        assert_eq!(ModuleId::from_module_path("my_mod::saves::slot").as_str(), "my_mod");
        assert_eq!(ModuleId::from_module_path("my_mod").as_str(), "my_mod");
        assert_eq!(ModuleId::from_module_path(module_path!()).as_str(), "mod_utils");
    }

    #[test]
    fn test_loaded_mods_exact_match() {
        let mut mods = LoadedMods::new();
        let owner = mods.register("car_tuner", ModRegistration::new("CarTuner", "Car Tuner", "1.0"));

        let found = mods.find_owner(&ModuleId::new("car_tuner")).unwrap();
        assert!(Arc::ptr_eq(&found, &owner));
        assert_eq!(found.mod_id(), "CarTuner");

        assert!(mods.find_owner(&ModuleId::new("car_tune")).is_none());
        assert!(mods.find_owner(&ModuleId::new("car_tuner_extra")).is_none());
    }

    #[test]
    fn test_loaded_mods_reregister_replaces() {
        let mut mods = LoadedMods::new();
        mods.register("radio", ModRegistration::new("Radio", "Radio", "1.0"));
        mods.register("radio", ModRegistration::new("Radio", "Radio", "1.1"));

        assert_eq!(mods.len(), 1);
        let found = mods.find_owner(&"radio".into()).unwrap();
        assert_eq!(found.registration.version, "1.1");
    }
}
