//! Process-wide module identity → owner record cache
//!
//! Entries are added on first resolution and never evicted. The cached value
//! is a pure function of the module identity, so concurrent inserts of the
//! same key are harmless: the first one wins and every caller sees it.

use std::sync::Arc;

use dashmap::DashMap;

use super::{ModuleId, OwnerRecord};

#[derive(Debug, Default)]
pub struct IdentityCache {
    entries: DashMap<ModuleId, Arc<OwnerRecord>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, module: &ModuleId) -> Option<Arc<OwnerRecord>> {
        self.entries.get(module).map(|entry| entry.value().clone())
    }

    /// Insert unless already present, returning the cached record
    pub fn insert_if_absent(&self, module: ModuleId, owner: Arc<OwnerRecord>) -> Arc<OwnerRecord> {
        self.entries.entry(module).or_insert(owner).value().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ModRegistration;

    fn owner(module: &str, version: &str) -> Arc<OwnerRecord> {
        Arc::new(OwnerRecord::new(
            ModuleId::new(module),
            ModRegistration::new(module, module, version),
        ))
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = IdentityCache::new();
        let first = owner("radio", "1.0");
        let second = owner("radio", "1.0");

        let kept = cache.insert_if_absent(ModuleId::new("radio"), first.clone());
        assert!(Arc::ptr_eq(&kept, &first));

        let kept = cache.insert_if_absent(ModuleId::new("radio"), second);
        assert!(Arc::ptr_eq(&kept, &first));
        assert!(Arc::ptr_eq(&cache.get(&"radio".into()).unwrap(), &first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_inserts_agree() {
        let cache = IdentityCache::new();
        let modules = ["radio", "car_tuner", "fuel_gauge"];

        let kept: Vec<Vec<Arc<OwnerRecord>>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        modules
                            .iter()
                            .map(|m| cache.insert_if_absent(ModuleId::new(*m), owner(m, "1.0")))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.len(), modules.len());
        for (i, module) in modules.iter().enumerate() {
            let cached = cache.get(&ModuleId::new(*module)).unwrap();
            for per_thread in &kept {
                assert!(Arc::ptr_eq(&per_thread[i], &cached));
            }
        }
    }
}
