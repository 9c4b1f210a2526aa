//! Error types for save/load calls
//!
//! Every failure is returned to the caller. Nothing here is meant to unwind
//! across the library boundary into the host.

use thiserror::Error;

use crate::identity::ModuleId;

/// Failure of a save/load entry point
#[derive(Debug, Error)]
pub enum SaveLoadError {
    /// No frame outside this library was found on the call chain
    #[error("could not determine the calling module")]
    IdentityUnresolved,

    /// The calling module is loaded but the host has no registration for it
    #[error("module `{0}` is not registered with the mod loader")]
    OwnerNotRegistered(ModuleId),

    /// A null value was passed for a write
    #[error("value for key `{key}` cannot be null")]
    NullValue { key: String },

    /// The store's typed operation family has no member for the type
    #[error("no {op} operation is bound for type `{type_name}`")]
    DispatchUnavailable {
        op: &'static str,
        type_name: &'static str,
    },

    /// Parallel key/value arrays of different lengths
    #[error("number of keys ({keys}) must match number of {what} ({values})")]
    LengthMismatch {
        keys: usize,
        values: usize,
        what: &'static str,
    },

    /// [`crate::SaveLoad::install`] was called a second time
    #[error("a save/load instance is already installed")]
    AlreadyInstalled,

    /// [`crate::SaveLoad::global`] was called before any instance was installed
    #[error("no save/load instance is installed")]
    NotInstalled,

    /// The store itself failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure raised by a persistence store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode value for key `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON has no NaN or infinity; such floats would come back as null
    #[error("value for key `{key}` cannot be stored as `{type_name}` (non-finite float?)")]
    Unrepresentable { key: String, type_name: &'static str },

    #[error("value at key `{key}` is not a valid `{type_name}`: {source}")]
    Decode {
        key: String,
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("save file `{path}` is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("key `{0}` does not exist")]
    Missing(String),
}

/// Failure loading a [`crate::SaveLoadConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T, E = SaveLoadError> = std::result::Result<T, E>;
