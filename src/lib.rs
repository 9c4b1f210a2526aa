//! Mod Utils - save/load helpers for game mods
//!
//! Core modules:
//! - `identity`: Which mod is calling (call-chain walk + identity cache)
//! - `dispatch`: Runtime-typed values routed to the store's typed operations
//! - `persistence`: Per-mod key/value stores (memory, JSON files)
//! - `save_load`: The entry points mods call
//! - `config`: Save directory and file settings

pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod persistence;
pub mod save_load;

pub use config::SaveLoadConfig;
pub use dispatch::{TypeKey, TypeRegistry, Value};
pub use error::{SaveLoadError, StoreError};
pub use identity::{LoadedMods, ModRegistration, ModuleId, OwnerRecord};
pub use persistence::{JsonFileStore, MemoryStore, PersistenceStore};
pub use save_load::{OwnerScope, SaveLoad};

/// Library configuration constants
pub mod consts {
    /// Crate name of this library; its frames are never the caller
    pub const LIBRARY_MODULE: &str = env!("CARGO_CRATE_NAME");
    /// Default directory for per-mod save files
    pub const DEFAULT_SAVE_DIR: &str = "Mods/Saves";
    /// Default save file extension
    pub const SAVE_FILE_SUFFIX: &str = ".json";
}
