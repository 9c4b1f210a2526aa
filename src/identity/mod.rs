//! Caller identity resolution
//!
//! - `owner`: module identities, host registrations, the module registry
//! - `chain`: call-chain introspection and the thread-local scoped chain
//! - `cache`: process-wide identity cache
//! - `resolver`: maps the current call to its owning mod

pub mod cache;
pub mod chain;
pub mod owner;
pub mod resolver;

pub use cache::IdentityCache;
pub use chain::{CallChain, Frame, FrameGuard, ScopedCallChain, depth, enter};
pub use owner::{LoadedMods, ModRegistration, ModuleId, ModuleRegistry, OwnerRecord};
pub use resolver::{CallerResolver, ResolverStats};
