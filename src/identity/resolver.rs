//! Resolve the module that owns the current save/load call
//!
//! The owner is the innermost frame on the call chain whose module is not this
//! library. Library frames (a batch write forwarding to a single write, say)
//! are skipped, so the answer is always the nearest external caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{CallChain, IdentityCache, ModuleId, ModuleRegistry, OwnerRecord};
use crate::error::{Result, SaveLoadError};

/// Counters for resolver activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Call-chain walks performed
    pub walks: u64,
    /// Resolutions answered from the identity cache
    pub cache_hits: u64,
    /// Lookups sent to the module registry
    pub registry_lookups: u64,
}

pub struct CallerResolver {
    library: ModuleId,
    chain: Arc<dyn CallChain>,
    registry: Arc<dyn ModuleRegistry>,
    cache: IdentityCache,
    walks: AtomicU64,
    cache_hits: AtomicU64,
    registry_lookups: AtomicU64,
}

impl CallerResolver {
    /// Create a resolver that skips frames belonging to `library`
    pub fn new(library: ModuleId, chain: Arc<dyn CallChain>, registry: Arc<dyn ModuleRegistry>) -> Self {
        Self {
            library,
            chain,
            registry,
            cache: IdentityCache::new(),
            walks: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            registry_lookups: AtomicU64::new(0),
        }
    }

    pub fn library(&self) -> &ModuleId {
        &self.library
    }

    /// Owner record of the nearest module outside this library
    pub fn resolve(&self) -> Result<Arc<OwnerRecord>> {
        let module = self.calling_module()?;

        if let Some(owner) = self.cache.get(&module) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(owner);
        }

        self.registry_lookups.fetch_add(1, Ordering::Relaxed);
        match self.registry.find_owner(&module) {
            Some(owner) => {
                log::debug!("Resolved module `{}` to mod `{}`", module, owner.mod_id());
                Ok(self.cache.insert_if_absent(module, owner))
            }
            None => {
                log::error!("Could not find a registered mod for module `{}`", module);
                Err(SaveLoadError::OwnerNotRegistered(module))
            }
        }
    }

    /// Module of the innermost frame not defined by this library
    pub fn calling_module(&self) -> Result<ModuleId> {
        self.walks.fetch_add(1, Ordering::Relaxed);
        let library = &self.library;
        match self.chain.find_frame(&mut |frame| frame.module != *library) {
            Some(frame) => Ok(frame.module),
            None => {
                log::error!("Could not determine the calling module");
                Err(SaveLoadError::IdentityUnresolved)
            }
        }
    }

    pub fn cached_modules(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            walks: self.walks.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            registry_lookups: self.registry_lookups.load(Ordering::Relaxed),
        }
    }
}
